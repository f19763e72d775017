use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;
use types::layout::{MemoryLayout, RAM_BASE};
use vm::Machine;

/// Run a guest image on the RV32 supervisor core and report how it stopped.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Guest image: a RISC-V ELF or a flat binary
    image: PathBuf,

    /// Load address for flat binaries (ELF segments carry their own)
    #[arg(long, value_parser = parse_hex_or_dec, default_value = "0x80000000")]
    load_addr: u32,

    /// Entry point; defaults to the ELF entry or the flat load address
    #[arg(long, value_parser = parse_hex_or_dec)]
    entry: Option<u32>,

    /// Stop after this many instructions
    #[arg(long, default_value_t = 10_000_000)]
    max_steps: u64,

    /// Dump registers and CSRs when the machine stops
    #[arg(short, long)]
    dump: bool,

    /// Hex-dump this many bytes of memory at --load-addr on exit
    #[arg(long)]
    dump_mem: Option<u32>,
}

fn parse_hex_or_dec(s: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x") {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("invalid address {:?}: {}", s, e))
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let image = fs::read(&args.image)
        .with_context(|| format!("failed to read image {:?}", args.image))?;

    let layout = MemoryLayout::default();
    let mut machine = Machine::new(&layout, RAM_BASE);

    let entry = match Elf::parse(&image) {
        Ok(elf) => load_elf(&mut machine, &elf, &image)?,
        Err(_) => {
            log::info!("not an ELF, loading as flat binary");
            machine
                .load_image(args.load_addr, &image)
                .with_context(|| format!("image does not fit at 0x{:08x}", args.load_addr))?;
            args.load_addr
        }
    };
    let entry = args.entry.unwrap_or(entry);
    machine.reset(entry);
    log::info!("starting at 0x{:08x}", entry);

    let halt = machine.run(args.max_steps);
    let instret = machine.hart.csr.instret;

    match halt {
        Some(reason) => println!(
            "halted after {} instructions: {} (pc = 0x{:08x})",
            instret, reason, machine.hart.pc
        ),
        None => println!(
            "step budget of {} exhausted (pc = 0x{:08x})",
            args.max_steps, machine.hart.pc
        ),
    }

    if args.dump {
        print!("{}", machine.dump_state());
    }
    if let Some(len) = args.dump_mem {
        let bytes = machine
            .memory
            .read(args.load_addr, len)
            .context("dump window is not backed by any region")?;
        for (i, chunk) in bytes.chunks(16).enumerate() {
            println!(
                "0x{:08x}: {}",
                args.load_addr + (i as u32) * 16,
                hex::encode(chunk)
            );
        }
    }

    Ok(())
}

/// Load every PT_LOAD segment at its physical address and return the entry
/// point.
fn load_elf(machine: &mut Machine, elf: &Elf, image: &[u8]) -> Result<u32> {
    if elf.is_64 {
        bail!("64-bit ELF; this core is RV32 only");
    }
    for ph in elf.program_headers.iter().filter(|ph| ph.p_type == PT_LOAD) {
        let paddr = ph.p_paddr as u32;
        let file_range = ph.file_range();
        let segment = image
            .get(file_range.clone())
            .context("segment file range out of bounds")?;
        log::info!(
            "segment: 0x{:08x} ({} bytes file, {} bytes mem)",
            paddr,
            segment.len(),
            ph.p_memsz
        );
        machine
            .load_image(paddr, segment)
            .with_context(|| format!("segment does not fit at 0x{:08x}", paddr))?;
        // p_memsz beyond p_filesz is bss; the backing is zeroed already.
    }
    Ok(elf.entry as u32)
}
