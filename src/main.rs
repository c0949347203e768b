use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap_stdin::FileOrStdin;

use quadc::{compile_with_layout, config::MemoryLayout, report};

#[derive(Parser)]
#[command(version, about = "Compile a source file into quadruples")]
struct Args {
    /// Source file, or `-` for stdin
    #[arg(default_value = "-")]
    input: FileOrStdin,

    /// Directory receiving the report files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Also print the generated program to stdout
    #[arg(short, long)]
    print: bool,

    #[arg(long)]
    stack_pointer: Option<usize>,

    #[arg(long)]
    stack_base: Option<usize>,

    #[arg(long)]
    data_start: Option<usize>,

    /// Base of the temporaries; array cells start at twice this address
    #[arg(long)]
    temp_start: Option<usize>,
}

impl Args {
    fn layout(&self) -> MemoryLayout {
        let mut layout = match self.temp_start {
            Some(temp_start) => MemoryLayout::with_temp_start(temp_start),
            None => MemoryLayout::default(),
        };
        if let Some(sp) = self.stack_pointer {
            layout.stack_pointer = sp;
        }
        if let Some(base) = self.stack_base {
            layout.stack_base = base;
        }
        if let Some(start) = self.data_start {
            layout.data_start = start;
        }
        layout
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let layout = args.layout();
    let source = args
        .input
        .contents()
        .context("failed to read the source program")?;

    let compilation = compile_with_layout(&source, layout);
    report::write_all(&compilation, &args.out_dir)
        .with_context(|| format!("failed to write reports to {}", args.out_dir.display()))?;

    if args.print {
        print!("{}", compilation.program_text());
    }
    Ok(())
}
