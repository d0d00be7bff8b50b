use anyhow::{Result, bail};
use std::sync::Arc;
use wingman::application::UseCaseContainer;
use wingman::domain::cancellation::CancellationToken;
use wingman::domain::entities::{Package, QueueAction, QueueItem, QueueItemStatus};
use wingman::domain::repositories::{
    CatalogRepository, PackageRepository, PackageStatusRepository, ToolRunner,
};
use wingman::domain::services::CatalogFilter;
use wingman::infrastructure::config_repository::data_dir;
use wingman::infrastructure::winget::{PackageInfoResolver, WingetCommand, WingetPackageRepository};
use wingman::infrastructure::{ConfigRepository, JsonCatalogRepository, ProcessRunner};

const USAGE: &str = "\
usage: wingman [command]

commands:
  status [--search <q>] [--category <c>]
                      scan catalog packages and print their state (default)
  list [--search <q>] [--category <c>]
                      print the catalog as last scanned, without running winget
  categories          print the catalog's categories
  check               report whether winget is available
  show <id>           print registry details for a package
  install <id>...     install packages that are not installed yet
  uninstall <id>...   uninstall installed packages
  upgrade <id>...     upgrade installed packages
  add <id>            add a package to the custom catalog
  remove <id>         remove a package from the custom catalog
  config              write the current configuration file and print its path";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config_repository = ConfigRepository::new();
    let config = config_repository.load()?;
    tracing::debug!("Using {} with data dir {}", config.executable, data_dir(&config).display());

    let runner: Arc<dyn ToolRunner> = Arc::new(ProcessRunner::new(config.executable.clone()));
    let command = Arc::new(WingetCommand::new(
        runner,
        config.query_timeout(),
        config.action_timeout(),
    ));
    let status: Arc<dyn PackageStatusRepository> =
        Arc::new(PackageInfoResolver::new(Arc::clone(&command)));
    let actions: Arc<dyn PackageRepository> = Arc::new(WingetPackageRepository::new(command));
    let catalog: Arc<dyn CatalogRepository> =
        Arc::new(JsonCatalogRepository::new(&data_dir(&config)));
    let use_cases = UseCaseContainer::new(status, actions, catalog, config.refresh_on_completion);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] => print_status(&use_cases, &CatalogFilter::new()).await,
        ["status", rest @ ..] => print_status(&use_cases, &parse_filter(rest)?).await,
        ["list", rest @ ..] => {
            let packages = use_cases.filter_catalog.execute(&parse_filter(rest)?).await?;
            print_packages(&packages);
            Ok(())
        }
        ["categories"] => {
            for category in use_cases.filter_catalog.categories().await? {
                println!("{category}");
            }
            Ok(())
        }
        ["check"] => {
            if use_cases.check_tool.execute().await {
                println!("winget is available");
                Ok(())
            } else {
                bail!("winget is not available")
            }
        }
        ["show", id] => {
            let cancel = CancellationToken::new();
            let Some(details) = use_cases.get_details.execute(id, &cancel).await else {
                bail!("no package found for {id}");
            };
            println!("{} ({})", details.display_name(), details.id);
            println!("  version:     {}", details.available_version);
            println!("  publisher:   {}", details.tags.join(", "));
            println!("  description: {}", details.description);
            Ok(())
        }
        ["install", ids @ ..] if !ids.is_empty() => {
            run_actions(&use_cases, ids, QueueAction::Install).await
        }
        ["uninstall", ids @ ..] if !ids.is_empty() => {
            run_actions(&use_cases, ids, QueueAction::Uninstall).await
        }
        ["upgrade", ids @ ..] if !ids.is_empty() => {
            run_actions(&use_cases, ids, QueueAction::Upgrade).await
        }
        ["add", id] => {
            if use_cases.add_custom.execute(Package::new(*id)).await? {
                println!("{id} added to the catalog");
            } else {
                println!("{id} is already in the catalog");
            }
            Ok(())
        }
        ["remove", id] => {
            if use_cases.remove_custom.execute(id).await? {
                println!("{id} removed from the catalog");
            } else {
                println!("{id} is not a custom catalog entry");
            }
            Ok(())
        }
        ["config"] => {
            config_repository.save(&config)?;
            println!("{}", config_repository.path().display());
            Ok(())
        }
        _ => {
            eprintln!("{USAGE}");
            bail!("unrecognized arguments: {}", args.join(" "))
        }
    }
}

fn parse_filter(args: &[&str]) -> Result<CatalogFilter> {
    let mut filter = CatalogFilter::new();
    let mut args = args.iter();
    while let Some(flag) = args.next() {
        let Some(value) = args.next() else {
            bail!("{flag} needs a value");
        };
        filter = match *flag {
            "--search" => filter.with_search(*value),
            "--category" => filter.with_category(*value),
            other => bail!("unknown option {other}"),
        };
    }
    Ok(filter)
}

async fn print_status(use_cases: &UseCaseContainer, filter: &CatalogFilter) -> Result<()> {
    if !use_cases.check_tool.execute().await {
        bail!("winget is not available");
    }

    let cancel = CancellationToken::new();
    let packages = use_cases.refresh_catalog.execute_filtered(filter, &cancel).await?;
    print_packages(&packages);
    Ok(())
}

fn print_packages(packages: &[Package]) {
    println!(
        "{:<32} {:<28} {:<16} {:<16} {}",
        "Name", "Id", "Installed", "Available", "Source"
    );
    for package in packages {
        let installed = if package.is_installed {
            package.installed_version.as_str()
        } else {
            "-"
        };
        let available = if package.update_available {
            package.available_version.as_str()
        } else {
            ""
        };
        println!(
            "{:<32} {:<28} {:<16} {:<16} {}",
            package.display_name(),
            package.id,
            installed,
            available,
            package.source
        );
    }
}

/// Queues `action` for every id whose current state allows it, then blocks
/// until all of them finish. Ctrl-C cancels whatever is still queued.
async fn run_actions(
    use_cases: &UseCaseContainer,
    ids: &[&str],
    action: QueueAction,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut known = Vec::new();
    let mut item_ids = Vec::new();
    for id in ids {
        match use_cases.resolve_status.execute(id, &cancel).await {
            Some(package) => known.push(package),
            None => {
                println!("{id}: status unknown, queuing {action} anyway");
                item_ids.push(use_cases.enqueue.execute(id, action)?);
            }
        }
    }

    let outcome = use_cases.enqueue_selected.execute(&known, action);
    for (id, reason) in &outcome.skipped {
        println!("{id}: skipped ({reason})");
    }
    item_ids.extend(outcome.queued);
    if item_ids.is_empty() {
        println!("Nothing to {}", action.to_string().to_lowercase());
        return Ok(());
    }

    let wait_all = async {
        let mut items = Vec::new();
        for item_id in &item_ids {
            items.extend(use_cases.queue.wait_for(*item_id).await);
        }
        items
    };
    let items: Vec<QueueItem> = tokio::select! {
        items = wait_all => items,
        _ = tokio::signal::ctrl_c() => {
            for item_id in &item_ids {
                use_cases.cancel.execute(*item_id);
            }
            let mut items = Vec::new();
            for item_id in &item_ids {
                items.extend(use_cases.queue.wait_for(*item_id).await);
            }
            items
        }
    };

    for item in &items {
        for line in &item.log {
            println!("  {line}");
        }
        println!("{} of {}: {}", item.action, item.package_id, item.status);
    }

    // Let the catalog refreshes triggered by completion finish before exiting.
    use_cases.queue.drain().await;
    if let Some(refresher) = &use_cases.refresher {
        refresher.settle().await;
    }

    let unfinished = items
        .iter()
        .filter(|item| item.status != QueueItemStatus::Completed)
        .count();
    if unfinished > 0 {
        bail!("{unfinished} of {} actions did not complete", items.len());
    }
    Ok(())
}
