//! Prints the tables of an MPK archive and resolves names against them.
//!
//! ```text
//! cargo run --example inspect -- \
//!     --archive war3.mpk --listfile listfile.txt units\\human\\footman.mdx
//! ```
use clap::Parser;
use mpk_archive::{ArchiveConfig, HashSlot, Listfile, Locale, MpkArchive, MpkError};
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "inspect")]
struct Cli {
    /// Archive to open (may be embedded in a larger file).
    #[clap(long)]
    pub archive: PathBuf,

    /// Known names, used to recover names of files listed by index.
    #[clap(long)]
    pub listfile: Option<PathBuf>,

    /// Preferred locale as a Windows LANGID, e.g. 1033.
    #[clap(long, default_value_t = 0)]
    pub locale: u16,

    /// Names to look up.
    pub names: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Cli::parse();

    let archive = MpkArchive::open(&args.archive, ArchiveConfig::new(Locale::new(args.locale)))?;
    if let Some(path) = &args.listfile {
        archive.attach_listfile(Listfile::from_reader(File::open(path)?)?);
    }

    let header = archive.header();
    info!(
        "archive at {:#x}: {} bytes, {} hash slots, {} blocks of {} bytes",
        archive.base_position(),
        header.archive_size,
        header.hash_table_size,
        header.block_table_size,
        archive.block_size()
    );

    let occupied = archive
        .hash_table()
        .slots()
        .iter()
        .filter(|slot| matches!(slot, HashSlot::Occupied(_)))
        .count();
    println!("{occupied} of {} hash slots occupied", archive.hash_table().len());

    for (index, block) in archive.block_table().iter().enumerate() {
        let index = index as u32;
        let name = match archive.recover_name(index) {
            Ok(name) => name,
            Err(MpkError::NameUnavailable { .. }) => "<encrypted, name unknown>".to_string(),
            Err(e) => return Err(e.into()),
        };
        println!(
            "{index:>6} {:#010x} {:>10} {:>10} {} {name}",
            block.file_pos, block.compressed_size, block.full_size, block.flags
        );
    }

    for name in &args.names {
        match archive.open_file(name.as_str()) {
            Ok(file) => {
                let locales = archive.locales(name.as_str())?;
                println!(
                    "{name}: block {:?}, {} unit(s), seed {:#010x}, locales {:?}",
                    file.block_index(),
                    file.block_count(),
                    file.seed(),
                    locales
                );
            }
            Err(e) => println!("{name}: {e} ({})", e.code()),
        }
    }

    Ok(())
}
