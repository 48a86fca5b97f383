use battant::{
    changes::{NewChange, Payload, Resource, ResourceId},
    validation::validate_change,
};
use battant_app::context::AppContext;
use clap::{Args, Subcommand};

use crate::cli::{parse_payload, render};

#[derive(Debug, Args)]
pub(crate) struct RemoteCommand {
    /// Resource (article, event)
    resource: Resource,

    #[command(subcommand)]
    command: RemoteSubcommand,
}

#[derive(Debug, Subcommand)]
enum RemoteSubcommand {
    /// List every row
    List,

    /// Show one row
    Get {
        /// Row id
        id: String,
    },

    /// Create a row
    Create {
        /// Fields as a JSON object
        #[arg(long, value_parser = parse_payload)]
        payload: Payload,
    },

    /// Update a row
    Update {
        /// Row id
        id: String,

        /// Fields as a JSON object
        #[arg(long, value_parser = parse_payload)]
        payload: Payload,
    },

    /// Delete a row
    Delete {
        /// Row id
        id: String,
    },
}

pub(crate) async fn run(context: &AppContext, command: RemoteCommand) -> Result<(), String> {
    let resource = command.resource;
    let service = context.service(resource);

    let records = match command.command {
        RemoteSubcommand::List => service.get_all().await,
        RemoteSubcommand::Get { id } => service
            .get_by_id(&ResourceId::from(id.as_str()))
            .await
            .map(|record| vec![record]),
        RemoteSubcommand::Create { payload } => {
            check(NewChange::create(resource, payload.clone()))?;

            service.create(payload).await.map(|record| vec![record])
        }
        RemoteSubcommand::Update { id, payload } => {
            let id = ResourceId::from(id.as_str());

            check(NewChange::update(resource, id.clone(), payload.clone()))?;

            service.update(&id, payload).await.map(|record| vec![record])
        }
        RemoteSubcommand::Delete { id } => service
            .delete(&ResourceId::from(id.as_str()))
            .await
            .map(|()| Vec::new()),
    }
    .map_err(|error| format!("{resource} request failed: {error}"))?;

    if !records.is_empty() {
        println!("{}", render::records(&records));
    }

    Ok(())
}

fn check(change: NewChange) -> Result<(), String> {
    validate_change(&change).map_err(|errors| format!("invalid {}: {errors}", change.resource))
}
