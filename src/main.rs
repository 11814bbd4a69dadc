mod btree;
mod error;
mod metadata;
mod node;
mod page;
mod record;

use anyhow::{bail, Result};
use btree::Btree;
use env_logger::Env;
use record::FixedBytesRecord;

const ORDER: usize = 32;
const RECORD_PAGE_SIZE: usize = 4096;
type Rec = FixedBytesRecord<64>;

fn encode_value(value: &str) -> Rec {
    let mut bytes = [0u8; 64];
    let src = value.as_bytes();
    let len = src.len().min(64);
    bytes[..len].copy_from_slice(&src[..len]);
    FixedBytesRecord(bytes)
}

fn decode_value(record: &Rec) -> String {
    let end = record.0.iter().position(|&b| b == 0).unwrap_or(64);
    String::from_utf8_lossy(&record.0[..end]).into_owned()
}

// Driver program exercising the engine's dot-commands without writing a
// separate test harness by hand.
fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();

    let args = std::env::args().collect::<Vec<_>>();
    match args.len() {
        0 | 1 => bail!("Missing <index name> and <command>"),
        2 => bail!("Missing <command>"),
        _ => {}
    }

    let mut tree: Btree<Rec> = Btree::open(&args[1], ORDER, RECORD_PAGE_SIZE)?;

    let command = &args[2];
    match command.as_str() {
        ".get" => {
            let key: i64 = args[3].parse()?;
            match tree.get(key)? {
                Some(record) => println!("{}", decode_value(&record)),
                None => println!("(nil)"),
            }
        }
        ".set" => {
            let key: i64 = args[3].parse()?;
            let value = &args[4];
            tree.set(key, encode_value(value))?;
            tree.flush()?;
        }
        ".delete" => {
            let key: i64 = args[3].parse()?;
            tree.delete(key)?;
            tree.flush()?;
        }
        ".print" => {
            tree.print_all()?;
        }
        ".flush" => {
            tree.flush()?;
        }
        _ => bail!("Unknown command: {command}"),
    }

    Ok(())
}
