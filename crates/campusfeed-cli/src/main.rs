use anyhow::Context;
use campusfeed_api::CampusClient;
use campusfeed_cache::StateCache;
use campusfeed_core::{
    BaasSource, Config, FeedRefresher, NotificationCenter, NotificationKind, NotificationState,
    RefreshOutcome, TypeFilter,
};
use clap::Parser;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "campusfeed")]
#[command(version, about = "Campus complaints and lost & found notification feed", long_about = None)]
struct Cli {
    /// Backend project URL
    #[arg(long, env = "CAMPUSFEED_URL", global = true)]
    url: Option<String>,

    /// Backend API key
    #[arg(long, env = "CAMPUSFEED_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Path to the read/dismissed state database
    #[arg(long, value_name = "PATH", global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Fetch once and print the feed
    Feed {
        /// Hide a notification type (complaint, lost, found); repeatable
        #[arg(long, value_name = "TYPE")]
        hide: Vec<NotificationKind>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Keep the feed fresh until Ctrl-C
    Watch {
        /// Seconds between refreshes
        #[arg(long)]
        interval: Option<u64>,
        #[arg(long, value_name = "TYPE")]
        hide: Vec<NotificationKind>,
    },
    /// Mark one notification as read
    Read {
        id: String,
    },
    /// Mark every visible notification as read
    ReadAll {
        #[arg(long, value_name = "TYPE")]
        hide: Vec<NotificationKind>,
    },
    /// Hide a notification for good
    Dismiss {
        id: String,
    },
    /// Forget which notifications were read
    ResetRead,
    /// Show how many ids are tracked
    Status,
    /// Write the current settings to the config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `feed --json` stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campusfeed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.url {
        config.backend.url = url;
    }
    if cli.api_key.is_some() {
        config.backend.api_key = cli.api_key;
    }
    if cli.state.is_some() {
        config.state.db_path = cli.state;
    }

    match cli.command {
        Commands::Feed { hide, json } => {
            let refresher = build_refresher(&config)?;
            let center = refresher.center();
            lock(&center)?.set_filter(TypeFilter::hiding(&hide));

            let outcome = refresher.run_cycle().await;
            report(&outcome);

            let output = {
                let center = lock(&center)?;
                if json {
                    serde_json::to_string_pretty(&center.visible())? + "\n"
                } else {
                    render_feed(&center)
                }
            };
            print!("{}", output);
        }
        Commands::Watch { interval, hide } => {
            let interval = interval
                .map(|secs| Duration::from_secs(secs.max(1)))
                .unwrap_or_else(|| config.refresh.interval());
            let refresher = build_refresher(&config)?.with_interval(interval);
            let center = refresher.center();
            lock(&center)?.set_filter(TypeFilter::hiding(&hide));

            tracing::info!("Refreshing every {}s, Ctrl-C to stop", interval.as_secs());
            let mut revisions = refresher.subscribe();
            let handle = refresher.start();

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = revisions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        // Render under the lock, print after releasing it
                        let output = {
                            let guard = lock(&center)?;
                            render_feed(&guard)
                        };
                        print!("{}", output);
                    }
                }
            }

            handle.shutdown().await;
        }
        Commands::Read { id } => {
            let mut state = open_state(&config)?;
            if state.mark_read(&id)? {
                println!("Marked {} as read", id);
            } else {
                println!("{} was already read", id);
            }
        }
        Commands::ReadAll { hide } => {
            let refresher = build_refresher(&config)?;
            let center = refresher.center();
            lock(&center)?.set_filter(TypeFilter::hiding(&hide));

            let outcome = refresher.run_cycle().await;
            report(&outcome);

            let marked = lock(&center)?.mark_all_read();
            println!("Marked {} notifications as read", marked);
        }
        Commands::Dismiss { id } => {
            let mut state = open_state(&config)?;
            if state.dismiss(&id)? {
                println!("Dismissed {}", id);
            } else {
                println!("{} was already dismissed", id);
            }
        }
        Commands::ResetRead => {
            let mut state = open_state(&config)?;
            let cleared = state.read_ids().len();
            state.reset_read_state()?;
            println!("Cleared read state for {} notifications", cleared);
        }
        Commands::Status => {
            let state = open_state(&config)?;
            println!("State database: {}", config.state_db_path()?.display());
            println!("Read:      {}", state.read_ids().len());
            println!("Dismissed: {}", state.dismissed_ids().len());
        }
        Commands::Init { force } => {
            let path = Config::config_path()?;
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let path = config.save()?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn open_state(config: &Config) -> anyhow::Result<NotificationState> {
    let path = config.state_db_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let cache = StateCache::open(&path)
        .with_context(|| format!("opening state database {}", path.display()))?;
    Ok(NotificationState::load(Box::new(cache)))
}

fn build_refresher(config: &Config) -> anyhow::Result<FeedRefresher> {
    let client = CampusClient::with_tables(
        config.backend.url.clone(),
        config.backend.api_key.clone(),
        config.backend.tables(),
    )?;
    let source = Arc::new(BaasSource::new(client));
    let center = Arc::new(Mutex::new(NotificationCenter::new(open_state(config)?)));

    Ok(FeedRefresher::new(source, center))
}

fn lock(
    center: &Arc<Mutex<NotificationCenter>>,
) -> anyhow::Result<std::sync::MutexGuard<'_, NotificationCenter>> {
    center
        .lock()
        .map_err(|_| anyhow::anyhow!("notification feed lock poisoned"))
}

fn report(outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Success { .. } | RefreshOutcome::Discarded => {}
        RefreshOutcome::PartialFailure { failed, .. } => {
            let names: Vec<_> = failed.iter().map(|k| k.as_str()).collect();
            eprintln!("warning: could not load {}", names.join(", "));
        }
        RefreshOutcome::Failed => eprintln!("warning: backend unreachable, nothing to show"),
    }
}

fn render_feed(center: &NotificationCenter) -> String {
    let mut out = String::new();
    let visible = center.visible();
    if visible.is_empty() {
        out.push_str("No notifications.\n");
        return out;
    }

    for n in &visible {
        let marker = if center.is_read(&n.id) { ' ' } else { '*' };
        let _ = writeln!(
            out,
            "{} [{:<9}] {}  {}  ({})",
            marker,
            n.kind().as_str(),
            n.date.format("%Y-%m-%d %H:%M"),
            n.title,
            n.id
        );
        if !n.message.is_empty() {
            let _ = writeln!(out, "      {}", n.message);
        }
        let meta = n.meta_summary();
        if !meta.is_empty() {
            let _ = writeln!(out, "      {}", meta);
        }
    }

    let hidden: Vec<_> = NotificationKind::all()
        .into_iter()
        .filter(|k| !center.filter().allows(*k))
        .map(|k| k.as_str())
        .collect();
    if hidden.is_empty() {
        let _ = writeln!(out, "{} unread", center.unread_count());
    } else {
        let _ = writeln!(out, "{} unread (hiding {})", center.unread_count(), hidden.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusfeed_api::{ComplaintRecord, LostItemRecord, RecordKey};
    use campusfeed_core::{normalize, RawRecord};

    fn center() -> NotificationCenter {
        let mut center = NotificationCenter::new(NotificationState::in_memory());
        center.apply_refresh(vec![
            normalize::normalize(RawRecord::Complaint(ComplaintRecord {
                id: Some(RecordKey::Text("c1".into())),
                title: Some("Wi-Fi down in Block B".into()),
                created_at: Some("2024-08-10".into()),
                ..Default::default()
            })),
            normalize::normalize(RawRecord::Lost(LostItemRecord {
                lost_id: Some(RecordKey::Text("l1".into())),
                title: Some("Black backpack".into()),
                date_lost: Some("2024-08-15".into()),
                ..Default::default()
            })),
        ]);
        center
    }

    #[test]
    fn test_render_feed_marks_unread() {
        let mut center = center();
        center.mark_read("c1");

        let output = render_feed(&center);
        let lines: Vec<_> = output.lines().filter(|l| l.contains('(')).collect();
        assert!(lines[0].starts_with("* [lost     ]"));
        assert!(lines[0].ends_with("(l1)"));
        assert!(lines[1].starts_with("  [complaint]"));
        assert!(output.ends_with("1 unread\n"));
    }

    #[test]
    fn test_render_feed_reports_hidden_types() {
        let mut center = center();
        center.set_filter(TypeFilter::hiding(&[NotificationKind::Lost]));

        let output = render_feed(&center);
        assert!(!output.contains("(l1)"));
        assert!(output.ends_with("1 unread (hiding lost)\n"));
    }

    #[test]
    fn test_render_empty_feed() {
        let center = NotificationCenter::new(NotificationState::in_memory());
        assert_eq!(render_feed(&center), "No notifications.\n");
    }
}
