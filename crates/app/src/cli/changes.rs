use battant::{
    changes::{ChangeId, ChangeKind, NewChange, Payload, Resource, ResourceId},
    validation::validate_change,
};
use battant_app::context::AppContext;
use clap::{Args, Subcommand};

use crate::cli::{parse_payload, render};

#[derive(Debug, Args)]
pub(crate) struct ChangesCommand {
    #[command(subcommand)]
    command: ChangesSubcommand,
}

#[derive(Debug, Subcommand)]
enum ChangesSubcommand {
    /// List pending changes, newest first
    List,

    /// Validate and queue a change
    Add(AddChangeArgs),

    /// Drop a pending change
    Remove(RemoveChangeArgs),

    /// Drop every pending change
    Clear,

    /// Send every pending change to the API
    Apply,
}

#[derive(Debug, Args)]
struct AddChangeArgs {
    /// Kind of change (create, update, delete)
    #[arg(long = "type")]
    kind: ChangeKind,

    /// Resource (article, event)
    #[arg(long)]
    resource: Resource,

    /// Resource fields as a JSON object
    #[arg(long, value_parser = parse_payload)]
    payload: Option<Payload>,

    /// Row to update or delete
    #[arg(long)]
    target_id: Option<String>,

    /// Where the change comes from
    #[arg(long)]
    source: Option<String>,
}

impl AddChangeArgs {
    fn into_change(self) -> NewChange {
        NewChange {
            kind: self.kind,
            resource: self.resource,
            payload: self.payload,
            target_id: self.target_id.as_deref().map(ResourceId::from),
            source: self.source,
        }
    }
}

#[derive(Debug, Args)]
struct RemoveChangeArgs {
    /// Change id
    id: String,
}

pub(crate) async fn run(context: &AppContext, command: ChangesCommand) -> Result<(), String> {
    let mut queue = context.changes();

    match command.command {
        ChangesSubcommand::List => {
            if queue.is_empty() {
                println!("no pending changes");
            } else {
                println!("{}", render::changes(queue.entries()));
            }

            Ok(())
        }
        ChangesSubcommand::Add(args) => {
            let change = args.into_change();

            if let Err(errors) = validate_change(&change) {
                for error in errors.errors() {
                    eprintln!("{error}");
                }

                return Err("change rejected".to_string());
            }

            let entry = queue
                .add_change(change)
                .map_err(|error| format!("failed to queue change: {error}"))?;

            println!("queued {}", entry.id);

            Ok(())
        }
        ChangesSubcommand::Remove(args) => {
            let removed = queue
                .remove_change(&ChangeId::from(args.id.as_str()))
                .map_err(|error| format!("failed to remove change: {error}"))?;

            if !removed {
                return Err(format!("no pending change with id {}", args.id));
            }

            Ok(())
        }
        ChangesSubcommand::Clear => queue
            .clear()
            .map_err(|error| format!("failed to clear changes: {error}")),
        ChangesSubcommand::Apply => {
            let report = context
                .applier()
                .apply(&mut queue)
                .await
                .map_err(|error| format!("failed to apply changes: {error}"))?;

            if report.is_empty() {
                println!("no pending changes");
                return Ok(());
            }

            println!("{}", render::report(&report));

            let failed = report.failures().count();

            if failed > 0 {
                return Err(format!("{failed} change(s) not applied, pending changes kept"));
            }

            Ok(())
        }
    }
}
