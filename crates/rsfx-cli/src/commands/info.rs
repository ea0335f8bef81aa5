//! `rsfx info` - print a script's header metadata.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use rsfx_bank::load_bank;
use rsfx_engine::{Environment, LoadOptions, load_program, sibling_bank_path};

/// Arguments for the info command.
#[derive(Args)]
pub struct InfoArgs {
    /// Script file to inspect
    pub input: PathBuf,

    /// Parse the main file only, skipping imports
    #[arg(long)]
    pub skip_imports: bool,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let options = LoadOptions {
        skip_imports: args.skip_imports,
    };
    let program = load_program(&args.input, &Environment::new(), options)
        .with_context(|| format!("failed to load '{}'", args.input.display()))?;
    let header = &program.main().header;

    println!("desc:    {}", header.desc);
    if !header.author.is_empty() {
        println!("author:  {}", header.author);
    }
    if !header.tags.is_empty() {
        println!("tags:    {}", header.tags.join(" "));
    }
    println!("in pins: {}", format_pins(&header.in_pins));
    println!("out pins: {}", format_pins(&header.out_pins));
    if program.units().len() > 1 {
        println!("imports: {}", program.units().len() - 1);
    }

    let sliders: Vec<_> = header.sliders_present().collect();
    if !sliders.is_empty() {
        println!("sliders:");
        for (id, slider) in sliders {
            let kind = if slider.is_enum {
                format!("enum[{}]", slider.enum_names.len())
            } else {
                format!("{}..{} step {}", slider.min, slider.max, slider.inc)
            };
            println!(
                "  slider{}: {} = {} ({})",
                id + 1,
                slider.desc,
                slider.def,
                kind
            );
        }
    }

    if let Some(bank_path) = sibling_bank_path(&args.input) {
        if let Some(bank) = load_bank(&bank_path) {
            println!("bank:    {} ({} presets)", bank.name, bank.presets.len());
        }
    }

    Ok(())
}

fn format_pins(pins: &[String]) -> String {
    if pins.is_empty() {
        return "none".to_string();
    }
    pins.iter()
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                format!("{}", i + 1)
            } else {
                name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
