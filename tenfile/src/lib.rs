use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::mem;
use std::path::Path;
use util::Endian;

/// A loadable PDP-10 word image: a dense run of 36-bit words (each stored in
/// the low bits of a `u64`) starting at `origin`, plus an optional start
/// address declared by the program.
#[derive(Debug, PartialEq)]
pub struct Image {
    origin: u64,
    start: Option<u64>,
    words: Vec<u64>,
}

impl Image {
    pub fn from(origin: u64, start: Option<u64>, words: Vec<u64>) -> Image {
        Image {
            origin,
            start,
            words,
        }
    }

    pub fn copy_from(origin: u64, start: Option<u64>, words: &[u64]) -> Image {
        Image {
            origin,
            start,
            words: Vec::from(words),
        }
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn start(&self) -> Option<u64> {
        self.start
    }

    pub fn words(&self) -> &[u64] {
        &self.words[..]
    }

    pub fn required_size(&self) -> usize {
        mem::size_of::<u64>() * (3 + self.words.len())
    }
}

pub fn read<R: Read>(reader: &mut R) -> std::io::Result<Image> {
    let word_count = reader.read_u64::<Endian>()?;
    let origin = reader.read_u64::<Endian>()?;
    // The start address is stored incremented by one so that zero can mean
    // "no start address"; every real address fits in 36 bits.
    let start_word = reader.read_u64::<Endian>()?;

    let mut words = vec![0u64; word_count as usize];
    for word in words.iter_mut() {
        *word = reader.read_u64::<Endian>()?;
    }

    let start = if start_word == 0 {
        None
    } else {
        Some(start_word - 1)
    };

    Ok(Image::from(origin, start, words))
}

pub fn write<W: Write>(writer: &mut W, image: &Image) -> std::io::Result<()> {
    writer.write_u64::<Endian>(image.words.len() as u64)?;
    writer.write_u64::<Endian>(image.origin)?;
    writer.write_u64::<Endian>(match image.start {
        Some(addr) => addr + 1,
        None => 0,
    })?;
    for word in image.words.iter() {
        writer.write_u64::<Endian>(*word)?;
    }
    Ok(())
}

pub trait ReadImageExt: Read + Sized {
    fn read_image(&mut self) -> std::io::Result<Image> {
        read(self)
    }
}

impl<R: Read + Sized> ReadImageExt for R {}

pub trait WriteImageExt: Write + Sized {
    fn write_image(&mut self, image: &Image) -> std::io::Result<()> {
        write(self, image)
    }
}

impl<W: Write + Sized> WriteImageExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> std::io::Result<Image> {
    BufReader::new(File::open(path)?).read_image()
}

pub fn write_file<P: AsRef<Path>>(path: P, image: &Image) -> std::io::Result<()> {
    BufWriter::new(File::create(path)?).write_image(image)
}
