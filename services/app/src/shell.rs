//! services/app/src/shell.rs
//!
//! The terminal front end. Reads one command per line from stdin, runs it
//! against the `App` and prints the resulting view. Auth-state changes from
//! the identity service and toast timeouts are applied between commands.

use crate::error::AppError;
use crate::state::App;
use chrono::TimeZone;
use cinnarios_core::calendar::MonthGrid;
use cinnarios_core::dashboard::DashboardFeature;
use cinnarios_core::domain::{DocumentaryType, ProfileUpdate};
use cinnarios_core::navigation::Screen;
use cinnarios_core::notify::NotificationId;
use cinnarios_core::session::{LoginRequest, RegistrationRequest};
use futures::StreamExt;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

const HELP: &str = "\
Commands:
  login <email> <password> [remember]     sign in
  signup <username> <email> <password> <confirm>
  google                                  sign in with Google
  logout
  go <screen> [id]                        home, documentaries, events, calendar,
                                          dashboard, profile, magazine, documentary, event
  back
  docs [video|article] [query]            list or search documentaries
  star <documentary-id>                   star or unstar
  comment <documentary-id> <text>
  events [query]                          list or search events
  register <event-id> | unregister <event-id>
  calendar | next | prev | day <n> | conflicts
  dashboard | toggle <notifications|dark-mode|auto-play|downloads>
  profile | profile set <name|username|bio|language> <value>
  dismiss                                 hide the current notification
  help | quit";

//=========================================================================================
// Command Parsing
//=========================================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Login {
        email: String,
        password: String,
        remember: bool,
    },
    SignUp {
        username: String,
        email: String,
        password: String,
        confirm_password: String,
    },
    Google,
    Logout,
    Go(Screen),
    Back,
    Documentaries {
        kind: Option<DocumentaryType>,
        query: String,
    },
    Star(String),
    Comment {
        documentary_id: String,
        text: String,
    },
    Events {
        query: String,
    },
    Register(String),
    Unregister(String),
    Calendar,
    NextMonth,
    PreviousMonth,
    Day(u32),
    Conflicts,
    Dashboard,
    Toggle(DashboardFeature),
    Profile,
    UpdateProfile(ProfileUpdate),
    Dismiss,
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match verb.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "login" => match args.as_slice() {
                [email, password] => Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                    remember: false,
                },
                [email, password, "remember"] => Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                    remember: true,
                },
                _ => return Err(CommandError::Usage("login <email> <password> [remember]")),
            },
            "signup" => match args.as_slice() {
                [username, email, password, confirm] => Command::SignUp {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    confirm_password: confirm.to_string(),
                },
                _ => {
                    return Err(CommandError::Usage(
                        "signup <username> <email> <password> <confirm>",
                    ))
                }
            },
            "google" => Command::Google,
            "logout" => Command::Logout,
            "go" => {
                let usage = CommandError::Usage("go <screen> [id]");
                let (name, id) = match args.as_slice() {
                    [name] => (*name, None),
                    [name, id] => (*name, Some(*id)),
                    _ => return Err(usage),
                };
                Command::Go(Screen::parse(name, id).ok_or(usage)?)
            }
            "back" => Command::Back,
            "docs" => {
                let kind = match args.first().map(|word| word.to_lowercase()).as_deref() {
                    Some("video") => Some(DocumentaryType::Video),
                    Some("article") => Some(DocumentaryType::Article),
                    _ => None,
                };
                let skip = usize::from(kind.is_some());
                Command::Documentaries {
                    kind,
                    query: args[skip..].join(" "),
                }
            }
            "star" => match args.as_slice() {
                [id] => Command::Star(id.to_string()),
                _ => return Err(CommandError::Usage("star <documentary-id>")),
            },
            "comment" => match args.as_slice() {
                [id, text @ ..] if !text.is_empty() => Command::Comment {
                    documentary_id: id.to_string(),
                    text: text.join(" "),
                },
                _ => return Err(CommandError::Usage("comment <documentary-id> <text>")),
            },
            "events" => Command::Events {
                query: args.join(" "),
            },
            "register" => match args.as_slice() {
                [id] => Command::Register(id.to_string()),
                _ => return Err(CommandError::Usage("register <event-id>")),
            },
            "unregister" => match args.as_slice() {
                [id] => Command::Unregister(id.to_string()),
                _ => return Err(CommandError::Usage("unregister <event-id>")),
            },
            "calendar" => Command::Calendar,
            "next" => Command::NextMonth,
            "prev" | "previous" => Command::PreviousMonth,
            "day" => match args.as_slice() {
                [day] => Command::Day(
                    day.parse()
                        .map_err(|_| CommandError::Usage("day <n>"))?,
                ),
                _ => return Err(CommandError::Usage("day <n>")),
            },
            "conflicts" => Command::Conflicts,
            "dashboard" => Command::Dashboard,
            "toggle" => {
                let usage =
                    CommandError::Usage("toggle <notifications|dark-mode|auto-play|downloads>");
                match args.as_slice() {
                    [name] => Command::Toggle(DashboardFeature::parse(name).ok_or(usage)?),
                    _ => return Err(usage),
                }
            }
            "profile" => match args.as_slice() {
                [] => Command::Profile,
                ["set", field, value @ ..] if !value.is_empty() => {
                    let value = value.join(" ");
                    let mut update = ProfileUpdate::default();
                    match field.to_lowercase().as_str() {
                        "name" => update.display_name = Some(value),
                        "username" => update.username = Some(value),
                        "bio" => update.bio = Some(value),
                        "language" => update.language = Some(value),
                        _ => {
                            return Err(CommandError::Usage(
                                "profile set <name|username|bio|language> <value>",
                            ))
                        }
                    }
                    Command::UpdateProfile(update)
                }
                _ => {
                    return Err(CommandError::Usage(
                        "profile set <name|username|bio|language> <value>",
                    ))
                }
            },
            "dismiss" => Command::Dismiss,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

//=========================================================================================
// The Read-Eval-Print Loop
//=========================================================================================

/// Runs until `quit` or end of input. `timed_out` carries the ids of
/// notifications whose auto-dismiss timer has run out.
pub async fn run<Tz: TimeZone>(
    app: &mut App<Tz>,
    mut timed_out: mpsc::UnboundedReceiver<NotificationId>,
) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut auth_changes = app.auth_changes();

    println!("Welcome to Cinnarios. Type 'help' for a list of commands.");
    print_screen(app);

    loop {
        print!("{}> ", app.screen());
        std::io::stdout().flush()?;

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input, leaving the shell.");
                    break;
                };
                app.expire_notifications();
                match Command::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => execute(app, command).await,
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            Some(change) = auth_changes.next() => {
                debug!(?change, "Auth state change received");
                app.handle_auth_change(change).await;
                println!();
            }
            Some(id) = timed_out.recv() => {
                if app.notification_timed_out(id) {
                    println!("\r(notification dismissed)");
                }
            }
        }
    }
    Ok(())
}

/// Runs one command. Failures have already been reported as notifications.
pub async fn execute<Tz: TimeZone>(app: &mut App<Tz>, command: Command) {
    match command {
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
        Command::Login {
            email,
            password,
            remember,
        } => {
            println!("Signing in...");
            let request = LoginRequest {
                email,
                password,
                remember: Some(remember),
            };
            if app.login(request).await.is_ok() {
                print_screen(app);
            }
        }
        Command::SignUp {
            username,
            email,
            password,
            confirm_password,
        } => {
            println!("Creating account...");
            let request = RegistrationRequest {
                username,
                email,
                password,
                confirm_password,
                accept_terms: None,
            };
            if app.sign_up(request).await.is_ok() {
                print_screen(app);
            }
        }
        Command::Google => {
            if app.login_with_google().await.is_ok() {
                print_screen(app);
            }
        }
        Command::Logout => {
            app.logout().await;
            print_screen(app);
        }
        Command::Go(screen) => {
            app.navigate(screen);
            print_screen(app);
        }
        Command::Back => {
            if app.back().is_some() {
                print_screen(app);
            } else {
                println!("Nothing to go back to.");
            }
        }
        Command::Documentaries { kind, query } => {
            let docs = app.catalog().search_documentaries(&query, kind);
            if docs.is_empty() {
                println!("No documentaries match.");
            }
            for doc in docs {
                let star = if app.catalog().is_starred(&doc.id) { "*" } else { " " };
                println!(
                    "{star} [{}] {} by {} ({} stars, {} comments)",
                    doc.id,
                    doc.title,
                    doc.artist.name,
                    doc.stars,
                    doc.comments.len()
                );
            }
        }
        Command::Star(id) => {
            if let Ok(toggle) = app.toggle_star(&id).await {
                println!("{} now has {} stars.", id, toggle.stars);
            }
        }
        Command::Comment {
            documentary_id,
            text,
        } => {
            let _ = app.comment(&documentary_id, &text);
        }
        Command::Events { query } => {
            let events = app.catalog().search_events(&query, None);
            if events.is_empty() {
                println!("No events match.");
            }
            for event in events {
                let mark = if app.is_registered(&event.id) { "registered" } else { "" };
                println!(
                    "[{}] {} - {} {} at {} ({} going) {mark}",
                    event.id,
                    event.title,
                    event.date,
                    event.time,
                    event.location,
                    event.registered_users.len()
                );
            }
        }
        Command::Register(id) => {
            let _ = app.register_for_event(&id).await;
        }
        Command::Unregister(id) => {
            let _ = app.unregister_from_event(&id).await;
        }
        Command::Calendar => {
            app.navigate(Screen::Calendar);
            print_screen(app);
        }
        Command::NextMonth => print_calendar(&app.next_month()),
        Command::PreviousMonth => print_calendar(&app.previous_month()),
        Command::Day(day) => {
            let _ = app.select_day(day);
        }
        Command::Conflicts => {
            let conflicts = app.conflicts();
            if conflicts.is_empty() {
                println!("No schedule conflicts.");
            }
            for conflict in conflicts {
                println!(
                    "{} and {} on {}",
                    conflict.first.title,
                    conflict.second.title,
                    conflict.first.registered_at.format("%Y-%m-%d")
                );
            }
        }
        Command::Dashboard => {
            app.navigate(Screen::Dashboard);
            print_screen(app);
        }
        Command::Toggle(feature) => {
            let _ = app.toggle_feature(feature).await;
        }
        Command::Profile => {
            app.navigate(Screen::Profile);
            print_screen(app);
        }
        Command::UpdateProfile(update) => {
            if app.update_profile(update).await.is_ok() {
                print_profile(app);
            }
        }
        Command::Dismiss => {
            if !app.dismiss_notification() {
                println!("No notification to dismiss.");
            }
        }
    }
}

//=========================================================================================
// Views
//=========================================================================================

fn print_screen<Tz: TimeZone>(app: &App<Tz>) {
    println!("== {} ==", app.screen());
    match app.screen().clone() {
        Screen::Onboarding => {
            println!("Discover African documentaries, events and magazines.");
            println!("Type 'login', 'signup' or 'go home' to start.");
        }
        Screen::Login => println!("Sign in with: login <email> <password> [remember]"),
        Screen::Home => {
            if let Some(session) = app.session() {
                println!("Welcome back, {}!", session.display_name);
            }
            println!("Featured:");
            for doc in app.catalog().featured_documentaries() {
                println!("  [{}] {}", doc.id, doc.title);
            }
            println!("Upcoming events:");
            for event in app.catalog().upcoming_events() {
                println!("  [{}] {} ({})", event.id, event.title, event.date);
            }
        }
        Screen::Documentaries => {
            for doc in app.catalog().documentaries() {
                println!("  [{}] {} - {}", doc.id, doc.title, doc.artist.name);
            }
        }
        Screen::DocumentaryDetail(id) => match app.catalog().documentary(&id) {
            Some(doc) => {
                println!("{}\n{}", doc.title, doc.description);
                println!(
                    "By {} ({}, {})",
                    doc.artist.name, doc.artist.profession, doc.artist.country
                );
                println!("{} views, {} stars", doc.views, doc.stars);
                for comment in &doc.comments {
                    println!("  {}: {}", comment.username, comment.content);
                }
            }
            None => println!("Documentary not found."),
        },
        Screen::Events => {
            for event in app.catalog().events() {
                println!("  [{}] {} - {}", event.id, event.title, event.location);
            }
        }
        Screen::EventDetail(id) => match app.catalog().event(&id) {
            Some(event) => {
                println!("{}\n{}", event.title, event.description);
                println!("{} {} at {}", event.date, event.time, event.location);
                println!(
                    "Organized by {}. {} of {} places taken.",
                    event.organizer,
                    event.registered_users.len(),
                    event.capacity
                );
                if app.is_registered(&id) {
                    println!("You are registered.");
                }
            }
            None => println!("Event not found."),
        },
        Screen::Calendar => print_calendar(&app.calendar()),
        Screen::Dashboard => {
            if let Ok(summary) = app.dashboard_summary() {
                println!("Hello, {}", summary.display_name);
                println!(
                    "Registered events: {}  Conflicts: {}",
                    summary.registered_events, summary.conflicts
                );
                println!(
                    "Watched: {}  Starred: {}  Attended: {}",
                    summary.stats.documentaries_watched,
                    summary.stats.documentaries_starred,
                    summary.stats.events_attended
                );
            }
            let prefs = app.dashboard_preferences();
            for feature in [
                DashboardFeature::Notifications,
                DashboardFeature::DarkMode,
                DashboardFeature::AutoPlay,
                DashboardFeature::Downloads,
            ] {
                let state = if prefs.is_enabled(feature) { "on" } else { "off" };
                println!("  {}: {}", feature.label(), state);
            }
        }
        Screen::Profile => print_profile(app),
        Screen::Magazine => {
            for magazine in app.catalog().magazines() {
                println!("{} ({})", magazine.title, magazine.issue);
                for article in &magazine.articles {
                    println!(
                        "  {} by {} - {}",
                        article.title, article.author, article.read_time
                    );
                }
            }
        }
    }
}

fn print_profile<Tz: TimeZone>(app: &App<Tz>) {
    let Some(session) = app.session() else {
        return;
    };
    let profile = &session.profile;
    println!("{} (@{})", session.display_name, profile.username);
    println!("{}", session.email);
    if let Some(bio) = &profile.bio {
        println!("{bio}");
    }
    println!(
        "Member since {}. Language: {}",
        profile.created_at.format("%B %Y"),
        profile.preferences.language
    );
}

fn print_calendar(grid: &MonthGrid) {
    println!("{:^28}", grid.cursor.label());
    println!(" Su  Mo  Tu  We  Th  Fr  Sa");
    for week in grid.weeks() {
        let row: String = week
            .iter()
            .map(|cell| match cell {
                Some(cell) if cell.has_events() => format!(" {:>2}*", cell.day),
                Some(cell) => format!(" {:>2} ", cell.day),
                None => "    ".to_string(),
            })
            .collect();
        println!("{}", row.trim_end());
    }
}
