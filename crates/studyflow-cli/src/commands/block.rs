//! Weekly unavailable time commands.

use clap::Subcommand;
use studyflow_core::{IdGenerator, JsonStore, UnavailableTimeBlock, UuidGenerator};

use super::{parse_clock, parse_weekday, print_json, weekday_name, CliResult};

#[derive(Subcommand)]
pub enum BlockAction {
    /// Add a recurring unavailable block
    Add {
        /// Weekday: 0-6 (Sunday first) or a name such as "mon"
        day: String,
        /// Start time HH:MM
        start: String,
        /// End time HH:MM (24:00 for end of day)
        end: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// List blocks
    List {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a block
    Remove {
        /// Block ID
        id: String,
    },
}

pub fn run(action: BlockAction) -> CliResult {
    let store = JsonStore::open()?;
    let mut availability = store.load_blocks()?;

    match action {
        BlockAction::Add {
            day,
            start,
            end,
            label,
        } => {
            let block = UnavailableTimeBlock::new(
                UuidGenerator.next_id(),
                parse_weekday(&day)?,
                parse_clock(&start)?,
                parse_clock(&end)?,
                label,
            )?;
            availability.add_block(block.clone())?;
            store.save_blocks(&availability)?;
            println!("Block added: {}", block.id);
        }
        BlockAction::List { json } => {
            if json {
                print_json(availability.blocks())?;
            } else if availability.is_empty() {
                println!("no blocks");
            } else {
                for b in availability.blocks() {
                    println!(
                        "{}  {} {:02}:{:02}-{:02}:{:02}  {}",
                        b.id,
                        weekday_name(b.day_of_week),
                        b.start_hour,
                        b.start_minute,
                        b.end_hour,
                        b.end_minute,
                        b.label.as_deref().unwrap_or("")
                    );
                }
            }
        }
        BlockAction::Remove { id } => {
            if availability.remove_block(&id).is_none() {
                return Err(format!("Block not found: {id}").into());
            }
            store.save_blocks(&availability)?;
            println!("Block removed: {id}");
        }
    }
    Ok(())
}
