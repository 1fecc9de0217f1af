use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::ReaderConfig;
use crate::consts::LEADER_SIZE;
use crate::control::ControlRecord;
use crate::dir::decode_directory;
use crate::document::{Document, Field};
use crate::leader::{decode_leader, Leader};
use crate::metrics;
use crate::plan::{plan_chunks, validate_entries};
use crate::reader::MstReader;
use crate::util::{display_text, hex_line, is_text};

#[derive(Parser, Debug)]
#[command(
    name = "mstreader",
    version,
    about = "Parallel reader for legacy master-file (MST) databases",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Leader, control record and totals
    Info {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Decode and print fields in layout order
    Dump {
        #[arg(long)]
        path: PathBuf,
        /// Worker count (default: MST_WORKERS or available parallelism)
        #[arg(long)]
        workers: Option<usize>,
        /// Only fields with this tag
        #[arg(long)]
        tag: Option<i32>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show the chunk plan without decoding
    Plan {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        workers: Option<usize>,
    },
}

#[derive(Serialize)]
struct InfoView<'a> {
    path: String,
    leader: &'a Leader,
    control: &'a ControlRecord,
    fields: usize,
    payload_bytes: u64,
    checksum: String,
}

// байт бинарного payload, показываемых в dump
const HEX_PREVIEW: usize = 64;

#[derive(Serialize)]
struct FieldView {
    tag: i32,
    index: usize,
    slot: u64,
    position: u64,
    len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hex: Option<String>,
}

impl FieldView {
    fn new(f: &Field) -> Self {
        let (text, hex) = if is_text(&f.payload) {
            (Some(display_text(&f.payload)), None)
        } else {
            (None, Some(hex_line(&f.payload, HEX_PREVIEW)))
        };
        Self {
            tag: f.tag,
            index: f.index,
            slot: f.slot,
            position: f.position,
            len: f.payload.len(),
            text,
            hex,
        }
    }
}

fn read_doc(path: &Path, workers: Option<usize>) -> Result<Document> {
    let mut cfg = ReaderConfig::from_env();
    if workers.is_some() {
        cfg = cfg.with_workers(workers);
    }
    MstReader::with_config(path, cfg)
        .read()
        .with_context(|| format!("read {}", path.display()))
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Info { path, json } => {
            let doc = read_doc(&path, None)?;
            if json {
                let view = InfoView {
                    path: path.display().to_string(),
                    leader: &doc.leader,
                    control: &doc.control,
                    fields: doc.fields.len(),
                    payload_bytes: doc.payload_bytes(),
                    checksum: format!("{:08x}", doc.checksum()),
                };
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                let l = &doc.leader;
                let c = &doc.control;
                println!("MST at {}", path.display());
                println!("  ctl_mfn        = {}", l.ctl_mfn);
                println!("  record_length  = {} bytes", l.record_length);
                println!("  record_count   = {}", l.record_count);
                println!("  base_address   = {}", l.base_address);
                println!("  field_count    = {}", l.field_count);
                println!("  status         = {}", l.status);
                println!("  version        = {}", l.version);
                println!("  data_len       = {} bytes", l.data_len);
                println!("  control @ {}", c.offset);
                println!("    mft_type     = {}", c.mft_type);
                println!("    record_count = {}", c.record_count);
                match c.next_volume() {
                    Some(nv) => println!("    next_volume  = mfn {} block {}", nv.mfn, nv.block),
                    None => println!("    next_volume  = (none)"),
                }
                println!("  fields         = {}", doc.fields.len());
                println!("  payload_bytes  = {}", doc.payload_bytes());
                println!("  checksum       = {:08x}", doc.checksum());
            }
        }
        Cmd::Dump {
            path,
            workers,
            tag,
            json,
        } => {
            let doc = read_doc(&path, workers)?;
            let views: Vec<FieldView> = doc
                .fields
                .iter()
                .filter(|f| tag.map_or(true, |t| f.tag == t))
                .map(FieldView::new)
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                for v in &views {
                    print!("#{} tag={} slot={} pos={} len={}", v.index, v.tag, v.slot, v.position, v.len);
                    match (&v.text, &v.hex) {
                        (Some(t), _) => println!("  {}", t),
                        (None, Some(h)) => println!("  [{}]", h),
                        (None, None) => println!(),
                    }
                }
            }
            let m = metrics::snapshot();
            log::debug!(
                "decoded {} record(s) in {} chunk(s), {:.1} record(s)/chunk",
                m.records_decoded,
                m.chunks_decoded,
                m.avg_records_per_chunk()
            );
        }
        Cmd::Plan { path, workers } => {
            // только leader + каталог: воркеры не запускаются
            let f = File::open(&path).with_context(|| format!("open {}", path.display()))?;
            let mut head = Vec::with_capacity(LEADER_SIZE);
            (&f).take(LEADER_SIZE as u64).read_to_end(&mut head)?;
            let leader = decode_leader(&head)?;
            (&f).take(leader.directory_len).read_to_end(&mut head)?;
            let dir = decode_directory(&head, &leader)?;
            validate_entries(&dir.entries, leader.data_len, leader.record_length)?;
            let w = workers.unwrap_or_else(|| ReaderConfig::from_env().effective_workers());
            let chunks = plan_chunks(leader.data_len, leader.record_length, w)?;
            println!(
                "{} record(s) × {} B over {} chunk(s) (workers={})",
                leader.record_count,
                leader.record_length,
                chunks.len(),
                w
            );
            for c in &chunks {
                println!(
                    "  chunk {:>3}: file [{}..{}) slots {}..{}",
                    c.index,
                    leader.base_address + c.start,
                    leader.base_address + c.end(),
                    c.first_slot,
                    c.first_slot + c.slots
                );
            }
        }
    }
    Ok(())
}
