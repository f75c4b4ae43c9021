//! Moderation bot entry-point: wires configuration, adapters and domain
//! services, then runs one moderation command.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Report, Result};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use moderation_bot::config::BotSettings;
use moderation_bot::domain::ports::{BlacklistRecordStore, LoginRecord};
use moderation_bot::domain::{
    AddToBlacklistRequest, BlacklistChange, BlacklistEntry, BlacklistPage, BlacklistService,
    BlacklistSyncService, ChangeClassification, DualSystemResult, Error as DomainError, ErrorCode,
    FleetCoordinator, PlayerActivityService, PlayerId, PlayerMatches, SyncProgress,
    SyncProgressReporter, SyncRun,
};
use moderation_bot::outbound::memory::InMemoryBlacklistStore;
use moderation_bot::outbound::realtime_db::{
    RealtimeDbBlacklistStore, RealtimeDbClient, RealtimeDbPlayerActivityRepository,
};
use moderation_bot::outbound::restriction::OpenCloudRestrictionClient;

/// `moderation-bot` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "moderation-bot",
    about = "Blacklist players across every configured universe",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Blacklist a player in the database and every universe.
    Add {
        #[arg(value_parser = parse_player_id)]
        user_id: PlayerId,
        /// Display name stored with the entry.
        #[arg(long)]
        username: Option<String>,
        /// Reason shown to the player.
        #[arg(long)]
        public_reason: Option<String>,
        /// Moderator-only note.
        #[arg(long)]
        hidden_reason: Option<String>,
    },
    /// Remove a player from the blacklist and lift their restrictions.
    Remove {
        #[arg(value_parser = parse_player_id)]
        user_id: PlayerId,
    },
    /// Show the stored blacklist entry for a player.
    Show {
        #[arg(value_parser = parse_player_id)]
        user_id: PlayerId,
    },
    /// Page through stored blacklist entries.
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Re-apply every stored entry across the fleet.
    Sync,
    /// Show username, country, timezones and login count.
    UserInfo {
        #[arg(value_parser = parse_player_id)]
        user_id: PlayerId,
    },
    /// Show the most recent login.
    LastLogin {
        #[arg(value_parser = parse_player_id)]
        user_id: PlayerId,
    },
    /// List every timezone a player has logged in from.
    TimezoneHistory {
        #[arg(value_parser = parse_player_id)]
        user_id: PlayerId,
    },
    /// Show recent logins, newest first.
    LoginHistory {
        #[arg(value_parser = parse_player_id)]
        user_id: PlayerId,
        /// Number of logins to show (1-50).
        #[arg(long)]
        count: Option<usize>,
    },
    /// Show the number of recorded logins.
    LoginCount {
        #[arg(value_parser = parse_player_id)]
        user_id: PlayerId,
    },
    /// List players who have logged in from a country code.
    PlayersFromCountry { country_code: String },
    /// List players whose timezones contain a name fragment.
    PlayersFromTimezone { timezone: String },
}

fn parse_player_id(raw: &str) -> Result<PlayerId, String> {
    PlayerId::new(raw).map_err(|error| error.to_string())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = BotSettings::load_from_iter([OsString::from("moderation-bot")])
        .wrap_err("failed to load moderation bot settings")?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(async move {
        let services = Services::from_settings(&settings)?;
        let output = services.run(args.command).await?;
        println!("{output}");
        Ok(())
    })
}

/// Domain services wired to the configured adapters.
struct Services {
    blacklist: BlacklistService,
    sync: Option<BlacklistSyncService>,
    activity: Option<PlayerActivityService>,
}

impl Services {
    fn from_settings(settings: &BotSettings) -> Result<Self> {
        let timeout = settings.request_timeout();

        let (store, activity) = match settings.database().wrap_err("invalid database settings")? {
            Some(database) => {
                let db = Arc::new(
                    RealtimeDbClient::new(database.url, database.auth, timeout)
                        .wrap_err("failed to build realtime database client")?,
                );
                let store: Arc<dyn BlacklistRecordStore> =
                    Arc::new(RealtimeDbBlacklistStore::new(Arc::clone(&db)));
                let activity =
                    PlayerActivityService::new(Arc::new(RealtimeDbPlayerActivityRepository::new(db)));
                (store, Some(activity))
            }
            None => {
                warn!("database_url not configured; using in-memory blacklist store");
                let store: Arc<dyn BlacklistRecordStore> = Arc::new(InMemoryBlacklistStore::new());
                (store, None)
            }
        };

        let fleet = match settings.fleet().wrap_err("invalid fleet settings")? {
            Some(fleet) => {
                let client =
                    OpenCloudRestrictionClient::new(fleet.base_url, fleet.api_key, timeout)
                        .wrap_err("failed to build restriction API client")?;
                Some(FleetCoordinator::new(Arc::new(client), fleet.targets))
            }
            None => {
                warn!("restriction API key or universe ids missing; fleet integration disabled");
                None
            }
        };

        let sync = fleet.clone().map(|fleet| {
            BlacklistSyncService::new(Arc::clone(&store), fleet, settings.sync_config())
        });
        Ok(Self {
            blacklist: BlacklistService::new(store, fleet, Arc::new(DefaultClock)),
            sync,
            activity,
        })
    }

    async fn run(&self, command: Command) -> Result<String> {
        match command {
            Command::Add {
                user_id,
                username,
                public_reason,
                hidden_reason,
            } => {
                let request = AddToBlacklistRequest {
                    player_id: user_id,
                    username: username.unwrap_or_default(),
                    public_reason,
                    hidden_reason,
                };
                Ok(render_change("add", &self.blacklist.add_to_blacklist(request).await))
            }
            Command::Remove { user_id } => Ok(render_change(
                "remove",
                &self.blacklist.remove_from_blacklist(&user_id).await,
            )),
            Command::Show { user_id } => match self.blacklist.find_entry(&user_id).await {
                Ok(Some(entry)) => Ok(render_entry(&entry)),
                Ok(None) => Ok(format!("User {user_id} is not blacklisted.")),
                Err(error) => reply_for_domain_error(error),
            },
            Command::List { offset, limit } => self
                .blacklist
                .list_entries(offset, limit)
                .await
                .map_or_else(reply_for_domain_error, |page| Ok(render_page(&page))),
            Command::Sync => {
                let sync = self
                    .sync
                    .as_ref()
                    .ok_or_else(|| eyre!("sync requires a restriction API key and universe ids"))?;
                Ok(render_sync(&sync.sync_all(&StdoutProgress).await?))
            }
            other => self.run_activity(other).await,
        }
    }

    async fn run_activity(&self, command: Command) -> Result<String> {
        let activity = self
            .activity
            .as_ref()
            .ok_or_else(|| eyre!("player queries require a configured database_url"))?;
        query_activity(activity, command)
            .await
            .or_else(reply_for_domain_error)
    }
}

/// Turn caller mistakes and missing data into a reply; anything else fails
/// the command.
fn reply_for_domain_error(error: DomainError) -> Result<String> {
    match error.code() {
        ErrorCode::InvalidRequest | ErrorCode::NotFound => Ok(error.message().to_owned()),
        _ => Err(Report::new(error).wrap_err("moderation command failed")),
    }
}

async fn query_activity(
    activity: &PlayerActivityService,
    command: Command,
) -> Result<String, DomainError> {
    let output = match command {
        Command::UserInfo { user_id } => {
            let summary = activity.user_info(&user_id).await?;
            format!(
                "User Information - {}\nUser ID: {}\nRecent Country: {}\nTotal Logins: {}\nKnown Timezones: {}",
                summary.username,
                summary.player_id,
                summary.recent_country,
                summary.total_logins,
                joined_or_none(&summary.timezones),
            )
        }
        Command::LastLogin { user_id } => {
            let last = activity.last_login(&user_id).await?;
            format!(
                "Last Login - {}\nDate & Time: {}\nCountry: {}\nTimezone: {}",
                last.display_name, last.value.timestamp, last.value.country_code, last.value.timezone
            )
        }
        Command::TimezoneHistory { user_id } => {
            let history = activity.timezone_history(&user_id).await?;
            format!(
                "Timezone History - {}\n{}",
                history.display_name,
                history.value.join("\n")
            )
        }
        Command::LoginHistory { user_id, count } => {
            let history = activity.login_history(&user_id, count).await?;
            format!(
                "Login History - {}\n{}",
                history.display_name,
                render_logins(&history.value)
            )
        }
        Command::LoginCount { user_id } => {
            let count = activity.login_count(&user_id).await?;
            format!(
                "Login Count - {}\nTotal recorded logins: {}",
                count.display_name, count.value
            )
        }
        Command::PlayersFromCountry { country_code } => {
            let matches = activity.players_from_country(&country_code).await?;
            render_matches(
                &format!("Users from Country: {}", country_code.trim().to_uppercase()),
                "No users found from this country",
                &matches,
            )
        }
        Command::PlayersFromTimezone { timezone } => {
            let matches = activity.players_from_timezone(&timezone).await?;
            render_matches(
                &format!("Users from Timezone: {timezone}"),
                "No users found from this timezone",
                &matches,
            )
        }
        other => {
            return Err(DomainError::internal(format!(
                "unsupported player query: {other:?}"
            )));
        }
    };
    Ok(output)
}

/// Prints one line per finished sync batch.
struct StdoutProgress;

#[async_trait]
impl SyncProgressReporter for StdoutProgress {
    async fn report(&self, progress: &SyncProgress) {
        println!(
            "batch {}/{}: {}/{} processed ({} full, {} partial, {} failed)",
            progress.batch,
            progress.batch_count,
            progress.processed,
            progress.total_users,
            progress.full_success_count,
            progress.partial_count,
            progress.fail_count,
        );
    }
}

fn render_change(action: &str, change: &BlacklistChange) -> String {
    match change {
        BlacklistChange::Applied { entry, result } => render_applied(action, entry, result),
        BlacklistChange::AlreadyBlacklisted(entry) => format!(
            "User {} ({}) is already blacklisted since {}.",
            entry.username(),
            entry.player_id(),
            render_date_added(entry)
        ),
        BlacklistChange::NotBlacklisted => "User is not blacklisted.".to_owned(),
        BlacklistChange::LookupFailed(error) => {
            format!("Could not check the blacklist, nothing was changed: {error}")
        }
    }
}

fn render_applied(action: &str, entry: &BlacklistEntry, result: &DualSystemResult) -> String {
    let headline = match result.classification() {
        ChangeClassification::FullSuccess => "completed in the database and every universe",
        ChangeClassification::PartialRemoteSide => {
            "saved in the database but not applied in every universe"
        }
        ChangeClassification::PartialLocalSide => {
            "applied in every universe but the database write failed"
        }
        ChangeClassification::TotalFailure => "failed",
        ChangeClassification::LocalOnlySuccess => {
            "completed in the database (universe integration not configured)"
        }
        ChangeClassification::LocalOnlyFailure => {
            "failed in the database (universe integration not configured)"
        }
    };
    let mut lines = vec![format!(
        "Blacklist {action} for {} ({}) {headline}.",
        entry.username(),
        entry.player_id()
    )];
    if let Some(error) = result.store_error() {
        lines.push(format!("Database: {error}"));
    }
    if let Some(fleet) = result.fleet() {
        lines.push(format!("Universes: {}", fleet.failure_summary()));
    }
    lines.join("\n")
}

fn render_entry(entry: &BlacklistEntry) -> String {
    format!(
        "User: {} ({})\nPublic reason: {}\nHidden reason: {}\nDate added: {}",
        entry.username(),
        entry.player_id(),
        entry.public_reason().unwrap_or("None"),
        entry.hidden_reason().unwrap_or("None"),
        render_date_added(entry)
    )
}

fn render_date_added(entry: &BlacklistEntry) -> String {
    entry
        .date_added()
        .map_or_else(|| "unknown date".to_owned(), |date| date.to_rfc3339())
}

fn render_page(page: &BlacklistPage) -> String {
    if page.entries.is_empty() {
        return format!("No blacklist entries on this page ({} total).", page.total);
    }
    let mut lines = vec![format!("Blacklisted users ({} total):", page.total)];
    lines.extend(page.entries.iter().map(|entry| {
        format!(
            "{} ({}) - {}",
            entry.username(),
            entry.player_id(),
            entry.public_reason().unwrap_or("No reason provided")
        )
    }));
    if let Some(next) = page.next_offset {
        lines.push(format!("Next page: --offset {next}"));
    }
    lines.join("\n")
}

fn render_sync(run: &SyncRun) -> String {
    if run.total_users == 0 {
        return "No users to sync.".to_owned();
    }
    let mut lines = vec![format!(
        "Sync complete: {} users\nFull success: {}\nPartial: {}\nFailed: {}",
        run.total_users, run.full_success_count, run.partial_count, run.fail_count
    )];
    if !run.errors.is_empty() {
        lines.push("Errors:".to_owned());
        lines.extend(run.errors.iter().map(|error| format!("- {error}")));
        if run.hidden_error_count() > 0 {
            lines.push(format!("... and {} more", run.hidden_error_count()));
        }
    }
    lines.join("\n")
}

fn render_logins(logins: &[LoginRecord]) -> String {
    logins
        .iter()
        .enumerate()
        .map(|(index, login)| {
            format!(
                "{}. {} - {} ({})",
                index + 1,
                login.timestamp,
                login.country_code,
                login.timezone
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_matches(title: &str, empty: &str, matches: &PlayerMatches) -> String {
    if matches.players.is_empty() {
        return format!("{title}\n{empty}");
    }
    let mut lines = vec![title.to_owned()];
    lines.extend(
        matches
            .players
            .iter()
            .map(|player| format!("{} (ID: {})", player.display_name, player.player_id)),
    );
    if matches.overflow() > 0 {
        lines.push(format!("\n... and {} more", matches.overflow()));
    }
    lines.join("\n")
}

fn joined_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_owned()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moderation_bot::domain::PlayerMatch;
    use rstest::rstest;

    #[rstest]
    #[case(&["add", "123", "--public-reason", "cheating"])]
    #[case(&["remove", "123"])]
    #[case(&["list", "--offset", "10", "--limit", "5"])]
    #[case(&["login-history", "123", "--count", "3"])]
    #[case(&["players-from-timezone", "Eastern Daylight Time"])]
    #[case(&["sync"])]
    fn parses_supported_commands(#[case] args: &[&str]) {
        let argv = std::iter::once("moderation-bot").chain(args.iter().copied());
        assert!(CliArgs::try_parse_from(argv).is_ok());
    }

    #[rstest]
    fn rejects_non_numeric_user_ids() {
        let parsed = CliArgs::try_parse_from(["moderation-bot", "remove", "abc"]);
        assert!(parsed.is_err());
    }

    #[rstest]
    fn sync_summary_reports_hidden_errors() {
        let run = SyncRun {
            total_users: 7,
            batches: 3,
            full_success_count: 1,
            partial_count: 0,
            fail_count: 6,
            errors: vec!["a (1): x".to_owned(); 5],
            error_count: 6,
        };
        let output = render_sync(&run);
        assert!(output.contains("Failed: 6"));
        assert!(output.ends_with("... and 1 more"));
    }

    #[rstest]
    fn match_listing_reports_overflow() {
        let player = PlayerMatch {
            player_id: PlayerId::new("1").expect("valid id"),
            display_name: "Alice".to_owned(),
        };
        let matches = PlayerMatches {
            players: vec![player],
            total: 3,
        };
        let output = render_matches("Users from Country: US", "none", &matches);
        assert_eq!(output, "Users from Country: US\nAlice (ID: 1)\n\n... and 2 more");
    }

    #[rstest]
    fn page_listing_points_at_next_offset() {
        let entry = BlacklistEntry::restore(
            PlayerId::new("10").expect("valid id"),
            "Ann",
            Some("exploiting".to_owned()),
            None,
            None,
        );
        let page = BlacklistPage {
            entries: vec![entry],
            total: 3,
            next_offset: Some(1),
        };
        assert_eq!(
            render_page(&page),
            "Blacklisted users (3 total):\nAnn (10) - exploiting\nNext page: --offset 1"
        );
    }

    #[rstest]
    #[case(DomainError::not_found("no data found for user ID: 7"))]
    #[case(DomainError::invalid_request("count must be between 1 and 50"))]
    fn caller_errors_become_replies(#[case] error: DomainError) {
        let message = error.message().to_owned();
        let reply = reply_for_domain_error(error).expect("reply");
        assert_eq!(reply, message);
    }

    #[rstest]
    #[case(DomainError::service_unavailable("realtime database offline"))]
    #[case(DomainError::internal("unexpected"))]
    fn backend_errors_fail_the_command(#[case] error: DomainError) {
        let report = reply_for_domain_error(error).expect_err("command fails");
        assert_eq!(report.to_string(), "moderation command failed");
    }

    #[rstest]
    fn entry_without_creation_time_renders_unknown_date() {
        let entry = BlacklistEntry::restore(
            PlayerId::new("200").expect("valid id"),
            "Dave",
            None,
            None,
            None,
        );
        let output = render_entry(&entry);
        assert!(output.ends_with("Date added: unknown date"), "{output}");
    }
}
