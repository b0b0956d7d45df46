use clap::Parser;
use sandbox_reader::{
    BytecodeReader, DecodeOptions, FormatRevision, OperationNames, Result, SINGLE_PROFILE_NAME, TableOffset,
    hexdump,
};
use std::path::PathBuf;

/// Inspect a compiled sandbox profile container.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the compiled bytecode
    input: PathBuf,

    /// Operation name table, one name per line
    #[arg(short, long)]
    operations: Option<PathBuf>,

    /// Decode with the 14-byte header that has no entitlement table
    #[arg(long)]
    legacy: bool,

    /// Write the resolved container as YAML (requires --operations)
    #[arg(long, requires = "operations")]
    yaml: bool,

    /// Print data blobs and opaque blocks as hex
    #[arg(long)]
    hexdump: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("\nERROR: Failed to read sandbox bytecode");
        eprintln!("  {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let revision = if args.legacy {
        FormatRevision::Legacy
    } else {
        FormatRevision::Entitlements
    };
    let reader = BytecodeReader::from_path_with(&args.input, DecodeOptions::default().with_revision(revision))?;

    let names = args
        .operations
        .as_ref()
        .map(OperationNames::from_path)
        .transpose()?;

    if args.yaml {
        if let Some(names) = &names {
            let bytecode = reader.resolve(names)?;
            let yaml = serde_yaml::to_string(&bytecode).map_err(std::io::Error::other)?;
            print!("{}", yaml);
        }
        return Ok(());
    }

    let header = reader.header();
    println!("Reading sandbox bytecode: {}", args.input.display());
    println!("{}", "=".repeat(60));
    println!("\nHeader:");
    println!("  Kind: {}", if header.is_collection() { "collection" } else { "single profile" });
    println!("  Revision: {:?}", header.revision);
    println!("  Table operations: {}", header.table_operation_count);
    println!("  Table base: {:#x}", reader.table_base());

    println!("\nSections:");
    for section in reader.sections() {
        println!("  {:<18} {}", section.label, section.count);
    }

    println!("\nProfiles:");
    for profile in &reader.raw().profiles {
        let label = match profile.name_offset {
            Some(offset) => format!("name at +{:#x}", offset.position()),
            None => SINGLE_PROFILE_NAME.to_string(),
        };
        println!(
            "  [{}] {} (mask {:#06x}, data at {:#x})",
            profile.index, label, profile.syscall_mask, profile.offset
        );
    }

    if let Some(names) = &names {
        let bytecode = reader.resolve(names)?;
        println!("\nVariables:");
        for variable in &bytecode.variables {
            println!("  {:>4} {}", variable.index, variable.value);
        }
        println!("\nEntitlements:");
        for entitlement in &bytecode.entitlements {
            println!("  {:>4} {}", entitlement.index, entitlement.value);
        }
        for profile in &bytecode.profiles {
            println!("\nProfile: {}", profile.name);
            for operation in &profile.operations {
                println!(
                    "  {:>4} {:<40} -> entry {}",
                    operation.operation_id, operation.name, operation.operation_entry
                );
            }
        }
    }

    println!("\nOperation Entries:");
    for (index, entry) in reader.raw().operation_entries.iter().enumerate() {
        println!("  {:>4} at {:#x}: {}", index, entry.offset, entry);
    }

    if args.hexdump {
        dump_blobs(&reader, "Regex", &reader.raw().regexes)?;
        dump_blobs(&reader, "Variable state", &reader.raw().variable_states)?;
        for (index, block) in reader.raw().opaque_blocks.iter().enumerate() {
            println!("\nOpaque block {}:", index);
            println!("{}", hexdump(&block.data, block.offset));
        }
    }

    Ok(())
}

fn dump_blobs(reader: &BytecodeReader, label: &str, offsets: &[TableOffset]) -> Result<()> {
    for (index, &offset) in offsets.iter().enumerate() {
        let data = reader.read_sized(offset)?;
        println!("\n{} {} at +{:#x}:", label, index, offset.position());
        println!("{}", hexdump(&data, 0));
    }
    Ok(())
}
