#[macro_use]
extern crate clap;

use clap::Arg;
use pdp10::Debugger;
use std::path::PathBuf;

#[derive(Debug)]
enum Error {
    Macro10(macro10::Error),
    Io(std::io::Error, PathBuf),
    BadAddress(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // the assembler already reported itself through the console
            Error::Macro10(err) => write!(f, "{}", err),
            Error::Io(err, path) => {
                write!(f, "Writing output file \"{}\" failed: {}", path.display(), err)
            }
            Error::BadAddress(text) => write!(f, "Bad octal load address \"{}\"", text),
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Source file(s) to assemble, separated by semicolons")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the image file to write to"),
        )
        .arg(
            Arg::with_name("address")
                .short("a")
                .long("address")
                .takes_value(true)
                .value_name("ADDRESS")
                .default_value("0")
                .help("Load address, in octal"),
        )
        .arg(
            Arg::with_name("preprocess")
                .short("p")
                .long("preprocess")
                .help("Echo the joined source text instead of assembling"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output");
    let address = matches.value_of("address").unwrap();
    let options = if matches.is_present("preprocess") {
        "p"
    } else {
        ""
    };

    if let Err(err) = macro10_cli(input, output, address, options) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn macro10_cli(
    input: &str,
    output: Option<&str>,
    address: &str,
    options: &str,
) -> Result<(), Error> {
    let load_address =
        u64::from_str_radix(address, 8).map_err(|_| Error::BadAddress(address.to_owned()))?;

    let mut dbg = Debugger::new();
    let mut asm = macro10::Macro10::new(
        &mut dbg,
        load_address,
        macro10::Options::from_letters(options),
    );
    asm.assemble_resources(input, &mut macro10::FileLoader)
        .map_err(Error::Macro10)?;

    if options.contains('p') {
        return Ok(());
    }

    if let Some(start) = asm.start() {
        println!("start address: {:o}", start);
    }

    let first = input.split(';').next().unwrap_or(input).trim();
    let output_path: PathBuf = output
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(first).with_extension("ten"));

    let image = asm.into_image();
    tenfile::write_file(&output_path, &image).map_err(|err| Error::Io(err, output_path))?;

    Ok(())
}
