use jimage_decompress::jimage::{self, Endianness, ImageStrings, Properties};

use clap::{crate_version, value_parser, Arg, ArgAction, Command};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), jimage::Error> {
    env_logger::init();

    let matches = Command::new("jimage resource decompressor")
        .version(crate_version!())
        .about("Decompress (or compress) a single resource of a jimage file")
        .arg(
            Arg::new("strings")
                .long("strings")
                .value_name("FILE")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Image string table (created when compressing, if missing)"),
        )
        .arg(
            Arg::new("little-endian")
                .long("little-endian")
                .action(ArgAction::SetTrue)
                .help("Headers are little endian (default is big endian)"),
        )
        .arg(
            Arg::new("compress")
                .long("compress")
                .value_name("PLUGIN")
                .action(ArgAction::Append)
                .value_parser(["zip", "compact-cp"])
                .help("Compress instead, applying plugins in the order given"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Output file (defaults to the input with `.out` appended)"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Resource to process")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .get_matches();

    let input = required_path(matches.get_one::<PathBuf>("INPUT"), "INPUT")?;
    let strings_path = required_path(matches.get_one::<PathBuf>("strings"), "--strings")?;
    let output = match matches.get_one::<PathBuf>("output") {
        Some(output) => output.clone(),
        None => {
            let mut output = OsString::from(input.as_os_str());
            output.push(".out");
            PathBuf::from(output)
        }
    };
    let order = if matches.get_flag("little-endian") {
        Endianness::Little
    } else {
        Endianness::Big
    };

    log::info!("Reading '{}'", input.display());
    let content = fs::read(input)?;

    let result = match matches.get_many::<String>("compress") {
        None => {
            let strings = ImageStrings::from_bytes(fs::read(strings_path)?)?;
            let mut decompressor = jimage::Decompressor::new();
            decompressor.decompress_resource(order, &strings, &content)?
        }
        Some(plugins) => {
            let mut strings = if strings_path.exists() {
                ImageStrings::from_bytes(fs::read(strings_path)?)?
            } else {
                ImageStrings::new()
            };
            let mut resource = content;
            for plugin in plugins {
                let compressor = jimage::compressor_for(plugin, &Properties::new())?;
                resource =
                    jimage::compress_resource(compressor.as_ref(), &mut strings, &resource, order)?;
            }
            log::info!("Writing '{}'", strings_path.display());
            fs::write(strings_path, strings.as_bytes())?;
            resource
        }
    };

    log::info!("Writing '{}'", output.display());
    fs::write(&output, result)?;
    Ok(())
}

fn required_path<'a>(path: Option<&'a PathBuf>, name: &str) -> Result<&'a PathBuf, jimage::Error> {
    path.ok_or_else(|| jimage::Error::InvalidArgument(format!("missing {}", name)))
}
