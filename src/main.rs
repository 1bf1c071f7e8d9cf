use clap::{arg, crate_version, Command};
use std::fs::File;

const RCH: &str = "unreachable was reached";

/// Mirrors the original tool's default-outfile rule: `.comp` on compress,
/// strip a `.comp` suffix (if long enough to be meaningful) or append
/// `.decomp` on decompress.
fn default_outfile(infile: &str, decompress: bool) -> String {
    if decompress {
        if infile.ends_with(".comp") && infile.len() > 5 {
            infile[..infile.len() - 5].to_string()
        } else {
            format!("{infile}.decomp")
        }
    } else {
        format!("{infile}.comp")
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let long_help = "Examples:
---------
Compress:      `huffcompress myfile`
Decompress:    `huffcompress -d myfile.comp`";

    let main_cmd = Command::new("huffcompress")
        .about("Lossless file compression with canonical Huffman coding")
        .after_long_help(long_help)
        .version(crate_version!())
        .arg(arg!(<infile> "input path"))
        .arg(arg!(-o --outfile <PATH> "output path").required(false))
        .arg(arg!(-d --decompress "decompress instead of compress"));

    let matches = main_cmd.get_matches();

    let infile = matches.get_one::<String>("infile").expect(RCH);
    let decompress = matches.get_flag("decompress");
    let outfile = matches
        .get_one::<String>("outfile")
        .cloned()
        .unwrap_or_else(|| default_outfile(infile, decompress));

    let mut in_file = match File::open(infile) {
        Ok(f) => f,
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    };
    let mut out_file = File::create(&outfile)?;

    let result = if decompress {
        huffcompress::huffman::decode(&mut in_file, &mut out_file)
    } else {
        huffcompress::huffman::encode(&mut in_file, &mut out_file)
    };

    if let Err(error) = result {
        eprintln!("Error: {error}");
        drop(out_file);
        let _ = std::fs::remove_file(&outfile);
        std::process::exit(1);
    }

    Ok(())
}
