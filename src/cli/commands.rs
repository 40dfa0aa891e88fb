//! Command dispatch: resolves settings and the acting user, then calls services.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::{CategoryUpdate, ReorderItem, Reparent};
use crate::application::{ApplicationError, Viewer};
use crate::cli::args::{CategoryCommands, Cli, Commands, CommentCommands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_dir, global_config_path, local_config_path, Settings};
use crate::domain::{NewCategory, NewComment};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::render_forest;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Category { command }) => {
            let container = open_container(cli)?;
            _category(&container, command)
        }
        Some(Commands::Comment { command }) => {
            let container = open_container(cli)?;
            _comment(&container, command)
        }
        Some(Commands::Check) => {
            let container = open_container(cli)?;
            _check(&container)
        }
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

fn config_dir(cli: &Cli) -> PathBuf {
    cli.config_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(Some(config_dir(cli).as_path()))?;
    if let Some(data_file) = &cli.data_file {
        settings.data_file = data_file.clone();
    }
    if cli.acting_user.is_some() {
        settings.acting_user = cli.acting_user;
    }
    Ok(settings)
}

fn open_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = load_settings(cli)?;
    Ok(ServiceContainer::open(settings)?)
}

/// The acting user, if one is configured.
fn viewer(container: &ServiceContainer) -> CliResult<Option<Viewer>> {
    let Some(id) = container.settings.acting_user else {
        return Ok(None);
    };
    let user = container
        .users
        .find_user(id)
        .map_err(|e| InfraError::io(format!("look up user {id}"), e))?
        .ok_or_else(|| ApplicationError::not_found("user", id))?;
    debug!("acting as {} ({})", user.name, user.role);
    Ok(Some(Viewer::from(&user)))
}

fn require_viewer(container: &ServiceContainer) -> CliResult<Viewer> {
    viewer(container)?.ok_or_else(|| {
        CliError::Usage("no acting user: pass --as <uuid> or set acting_user in config".into())
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| InfraError::io("encode JSON", io::Error::other(e)))?;
    output::info(&json);
    Ok(())
}

#[instrument(skip(container))]
fn _category(container: &ServiceContainer, command: &CategoryCommands) -> CliResult<()> {
    let service = &container.categories;
    match command {
        CategoryCommands::Tree { json } => {
            let trees = service.tree()?;
            if *json {
                return print_json(&trees);
            }
            output::info(&render_forest("categories", &trees));
        }
        CategoryCommands::List => {
            for c in service.list()? {
                let parent = c.parent_id.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
                output::info(&format!("{:>5} {:>5} {:>4}  {}", c.id, parent, c.order_index, c.name));
            }
        }
        CategoryCommands::Add {
            name,
            parent,
            description,
            order,
        } => {
            let viewer = require_viewer(container)?;
            let created = service.create(
                &viewer,
                NewCategory {
                    name: name.clone(),
                    description: description.clone(),
                    parent_id: *parent,
                    order_index: *order,
                },
            )?;
            output::success(&format!("created category {} ({})", created.name, created.id));
        }
        CategoryCommands::Update {
            id,
            name,
            description,
            order,
        } => {
            let viewer = require_viewer(container)?;
            let update = CategoryUpdate {
                name: name.clone(),
                description: description.clone(),
                order_index: *order,
                parent: Reparent::Keep,
            };
            let updated = service.update(&viewer, *id, update)?;
            output::success(&format!("updated category {}", updated.id));
        }
        CategoryCommands::Move { id, parent, root } => {
            let viewer = require_viewer(container)?;
            let target = match (parent, root) {
                (_, true) => Reparent::Root,
                (Some(p), false) => Reparent::Under(*p),
                (None, false) => {
                    return Err(CliError::InvalidArgs("give a parent id or --root".into()))
                }
            };
            let moved = service.update(
                &viewer,
                *id,
                CategoryUpdate {
                    parent: target,
                    ..Default::default()
                },
            )?;
            match moved.parent_id {
                Some(p) => output::success(&format!("moved {} under {}", moved.id, p)),
                None => output::success(&format!("moved {} to top level", moved.id)),
            }
        }
        CategoryCommands::Remove { id } => {
            let viewer = require_viewer(container)?;
            service.delete(&viewer, *id)?;
            output::success(&format!("deleted category {id}"));
        }
        CategoryCommands::Reorder { file } => {
            let viewer = require_viewer(container)?;
            let items = read_reorder_file(file)?;
            let updated = service.reorder(&viewer, items)?;
            output::success(&format!("reordered {} categories", updated.len()));
        }
    }
    Ok(())
}

fn read_reorder_file(path: &Path) -> CliResult<Vec<ReorderItem>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|e| {
        CliError::InvalidArgs(format!("{}: expected a JSON array of reorder items: {e}", path.display()))
    })
}

#[instrument(skip(container))]
fn _comment(container: &ServiceContainer, command: &CommentCommands) -> CliResult<()> {
    let service = &container.comments;
    match command {
        CommentCommands::Thread { topic, json } => {
            let viewer = viewer(container)?;
            let threads = service.thread(*topic, viewer.as_ref())?;
            if *json {
                return print_json(&threads);
            }
            output::info(&render_forest(&format!("topic {topic}"), &threads));
        }
        CommentCommands::Add {
            topic,
            content,
            reply_to,
        } => {
            let viewer = require_viewer(container)?;
            let created = service.create(
                &viewer,
                *topic,
                NewComment {
                    parent_comment_id: *reply_to,
                    content: content.clone(),
                },
            )?;
            output::success(&format!("posted comment {}", created.id));
        }
        CommentCommands::Edit { topic, id, content } => {
            let viewer = require_viewer(container)?;
            service.update(&viewer, *topic, *id, content.clone())?;
            output::success(&format!("edited comment {id}"));
        }
        CommentCommands::Remove { topic, id } => {
            let viewer = require_viewer(container)?;
            let deleted = service.delete(&viewer, *topic, *id)?;
            output::success(&format!("deleted {} comment(s)", deleted.len()));
        }
        CommentCommands::Like { topic, id } => {
            let viewer = require_viewer(container)?;
            if service.toggle_like(&viewer, *topic, *id)? {
                output::success(&format!("liked comment {id}"));
            } else {
                output::success(&format!("unliked comment {id}"));
            }
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn _check(container: &ServiceContainer) -> CliResult<()> {
    let categories = container.categories.audit()?;
    let comments = container.comments.audit()?;

    output::header("categories");
    if categories.is_empty() {
        output::success_detail("no issues");
    }
    for issue in &categories {
        output::failure(issue);
    }

    output::header("comments");
    if comments.is_empty() {
        output::success_detail("no issues");
    }
    for (topic, issue) in &comments {
        output::failure(&format!("topic {topic}: {issue}"));
    }

    let total = categories.len() + comments.len();
    if total > 0 {
        return Err(CliError::Integrity(total));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no config dir)".into());
            output::action("global", &global);
            output::action("local", &local_config_path(&config_dir(cli)).display());
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                let dir = global_config_dir()
                    .ok_or_else(|| CliError::Usage("cannot determine config directory".into()))?;
                std::fs::create_dir_all(&dir)
                    .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
                dir.join("notetree.toml")
            } else {
                local_config_path(&config_dir(cli))
            };
            if path.exists() {
                output::warning(&format!("{} already exists", path.display()));
                return Ok(());
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}
