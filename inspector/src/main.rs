use std::cmp::Ordering;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use log::error;
use serde::{Deserialize, Serialize};

use embervm_image::{
    load, BuiltinMethods, FunctionFault, GcRef, Image, LoaderHost, NativePtr, OpcodeDesc,
};

#[derive(ClapParser, Debug)]
#[command(about = "Structural inspector for embervm bytecode images")]
struct Args {
    /// Image file to inspect.
    input: PathBuf,

    /// Write the summary as YAML to this file instead of stdout text.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// A permissive host: accepts every opcode name and skips bytecode
/// validation, so the inspector reports purely structural health. Real
/// runtimes resolve against their static native tables instead.
#[derive(Default)]
struct InspectHost {
    arena: Vec<Vec<u8>>,
}

impl LoaderHost for InspectHost {
    fn make_string(&mut self, bytes: &[u8]) -> GcRef {
        self.arena.push(bytes.to_vec());
        GcRef(self.arena.len() as u32 - 1)
    }

    fn make_buffer(&mut self, bytes: &[u8]) -> GcRef {
        self.make_string(bytes)
    }

    fn compare_strings(&self, a: GcRef, b: GcRef) -> Ordering {
        self.arena[a.0 as usize].cmp(&self.arena[b.0 as usize])
    }

    fn resolve_opcode(&self, name: &[u8]) -> Option<&'static OpcodeDesc> {
        // short-lived tool: leaking one descriptor per distinct name is fine
        let name: &'static str =
            Box::leak(String::from_utf8_lossy(name).into_owned().into_boxed_str());
        Some(Box::leak(Box::new(OpcodeDesc { name, handler: NativePtr(0) })))
    }

    fn validate_function(
        &mut self,
        _image: &Image,
        _section: usize,
        _debug: bool,
    ) -> Result<(), FunctionFault> {
        Ok(())
    }

    fn callable_vtable(&self) -> NativePtr {
        NativePtr(0)
    }

    fn record_methods(&self) -> BuiltinMethods {
        BuiltinMethods {
            destroy: NativePtr(0),
            print: NativePtr(0),
            scan: NativePtr(0),
            gcsize: NativePtr(0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SectionSummary {
    index: usize,
    offset: u32,
    size: u32,
    kind: String,
    aux: u16,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassSummary {
    section: u32,
    object_bytes: u16,
    class_first: u16,
    class_last: u16,
}

#[derive(Debug, Serialize, Deserialize)]
struct ImageSummary {
    bytes: usize,
    sections: Vec<SectionSummary>,
    opcode_slots: usize,
    named_opcodes: Vec<String>,
    number_literals: usize,
    config_entries: usize,
    iface_member_names: usize,
    entry_point: Option<u32>,
    functions: usize,
    classes: Vec<ClassSummary>,
}

fn summarize(img: &Image) -> ImageSummary {
    ImageSummary {
        bytes: img.bytes().len(),
        sections: img
            .sections
            .iter()
            .enumerate()
            .map(|(index, s)| SectionSummary {
                index,
                offset: s.offset,
                size: s.size,
                kind: s
                    .ty()
                    .map(|t| format!("{t:?}"))
                    .unwrap_or_else(|| format!("Unknown(0x{:02x})", s.ty_raw)),
                aux: s.aux,
            })
            .collect(),
        opcode_slots: img.opcodes.len(),
        named_opcodes: img
            .opcode_descs
            .iter()
            .flatten()
            .map(|d| d.name.to_string())
            .collect(),
        number_literals: img.number_literals.len(),
        config_entries: img.config_data.len(),
        iface_member_names: img.iface_member_names.len(),
        entry_point: img.entry_point,
        functions: img.functions.len(),
        classes: img
            .class_vtables
            .iter()
            .map(|c| ClassSummary {
                section: c.section,
                object_bytes: c.object_bytes,
                class_first: c.class_first,
                class_last: c.class_last,
            })
            .collect(),
    }
}

fn print_text(summary: &ImageSummary) {
    println!("image: {} bytes, {} sections", summary.bytes, summary.sections.len());
    for s in &summary.sections {
        println!(
            "  [{:3}] {:>8} +{:<6} aux={:<5} {}",
            s.index,
            format!("{:#x}", s.offset),
            s.size,
            s.aux,
            s.kind
        );
    }
    println!(
        "opcodes: {} slots, {} named",
        summary.opcode_slots,
        summary.named_opcodes.len()
    );
    println!("number literals: {}", summary.number_literals);
    println!("config entries:  {}", summary.config_entries);
    println!("iface names:     {}", summary.iface_member_names);
    match summary.entry_point {
        Some(s) => println!("entry point:     section {s}"),
        None => println!("entry point:     (none)"),
    }
    println!("functions:       {}", summary.functions);
    for c in &summary.classes {
        println!(
            "class {}..{}: {} bytes/instance (section {})",
            c.class_first, c.class_last, c.object_bytes, c.section
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let mut host = InspectHost::default();
    let img = match load(bytes, &mut host) {
        Ok(img) => img,
        Err(fail) => {
            error!(
                "load failed: {} (code {}, offset {:#x})",
                fail.error,
                fail.error.code(),
                fail.offset
            );
            error!(
                "partial image: {} of its sections were discovered",
                fail.image.sections.len()
            );
            bail!("invalid image");
        }
    };

    let summary = summarize(&img);
    match &args.output {
        Some(path) => {
            let yaml = serde_yaml::to_string(&summary)?;
            std::fs::write(path, yaml)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => print_text(&summary),
    }
    Ok(())
}
