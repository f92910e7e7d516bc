use chrono::Utc;
use clap::{Parser, Subcommand};
use meme_feed::{
    models::{relative_time, Meme},
    ApiError, AppError, Config, CredentialStore, Credentials, FeedSession, HttpMemeApi, MemeApi, MemeCard,
    MemeDraft,
};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "meme-feed", about = "Browse and post to the meme feed")]
struct Cli {
    /// Overrides MEME_API_BASE_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the token
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show the feed, scrolling through up to `pages` pages
    Feed {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show a meme's comments
    Comments {
        meme_id: String,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Post a comment on a meme
    Comment { meme_id: String, content: String },
    /// Publish a meme; captions are `TEXT` or `TEXT@X,Y` in the 800x450 frame
    Create {
        #[arg(long)]
        picture: PathBuf,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "caption")]
        captions: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "meme_feed=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = Config::load()?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url)?;
    }

    let api: Arc<dyn MemeApi> = Arc::new(HttpMemeApi::new(&config.api_base_url, config.http_timeout)?);
    let creds = Credentials::from_store(CredentialStore::new(&config.credentials_path))?;

    match cli.command {
        Command::Login { username, password } => {
            let login = api.login(&username, &password).await.map_err(|e| match e {
                ApiError::Unauthorized => AppError::InvalidInput("invalid username or password".into()),
                e => e.into(),
            })?;
            creds.set_token(login.jwt)?;
            println!("Logged in as {}.", username);
        }
        Command::Logout => {
            creds.clear();
            println!("Logged out.");
        }
        Command::Whoami => {
            let session = signed_in_session(api, creds)?;
            let me = session.current_user().await?;
            println!("{} ({})", me.username, me.id);
        }
        Command::Feed { pages } => {
            let mut session = signed_in_session(api, creds)?;
            session.load().await?;
            for _ in 1..pages {
                // Scroll the sentinel out of and back into view.
                session.on_feed_sentinel(false).await?;
                if session.on_feed_sentinel(true).await?.is_none() {
                    break;
                }
            }
            for card in session.meme_cards().await? {
                print_meme(&card);
            }
            if session.has_next_page() {
                println!("(more memes: rerun with --pages {})", session.feed().loaded_pages() + 1);
            }
        }
        Command::Comments { meme_id, pages } => {
            let mut session = signed_in_session(api, creds)?;
            find_meme(&mut session, &meme_id).await?;
            session.toggle_comments(&meme_id).await?;
            for _ in 1..pages {
                session.on_comments_sentinel(&meme_id, false).await?;
                if session.on_comments_sentinel(&meme_id, true).await?.is_none() {
                    break;
                }
            }
            let now = Utc::now();
            for card in session.comment_cards(&meme_id).await? {
                println!(
                    "{} · {}\n  {}",
                    author_name(card.author.as_ref().map(|a| a.username.as_str())),
                    relative_time(card.comment.created_at, now),
                    card.comment.content
                );
            }
        }
        Command::Comment { meme_id, content } => {
            let mut session = signed_in_session(api, creds)?;
            match session.post_comment(&meme_id, &content).await? {
                Some(comment) => println!("Posted comment {} on {}.", comment.id, meme_id),
                None => return Err(AppError::InvalidInput("comment is empty".into())),
            }
        }
        Command::Create {
            picture,
            description,
            captions,
        } => {
            if !creds.is_authenticated() {
                return Err(AppError::SignedOut);
            }
            let mut draft = MemeDraft::new();
            draft.set_picture(picture);
            draft.description = description;
            for raw in &captions {
                match parse_caption(raw)? {
                    (text, Some((x, y))) => draft.push_caption(text, x, y),
                    (text, None) => {
                        let index = draft.add_caption()?;
                        draft.update_caption(index, text)?;
                    }
                }
            }
            let meme = draft.publish(api.as_ref(), &creds).await?;
            println!("Published meme {}.", meme.id);
        }
    }
    Ok(())
}

fn signed_in_session(api: Arc<dyn MemeApi>, creds: Credentials) -> Result<FeedSession, AppError> {
    if !creds.is_authenticated() {
        return Err(AppError::SignedOut);
    }
    Ok(FeedSession::new(api, creds))
}

/// Scrolls the feed until `meme_id` is loaded.
async fn find_meme(session: &mut FeedSession, meme_id: &str) -> Result<(), AppError> {
    session.load().await?;
    loop {
        if session.memes().any(|m: &Meme| m.id == meme_id) {
            return Ok(());
        }
        session.on_feed_sentinel(false).await?;
        if session.on_feed_sentinel(true).await?.is_none() {
            return Err(AppError::InvalidInput(format!("no meme {} in the feed", meme_id)));
        }
    }
}

fn author_name(name: Option<&str>) -> &str {
    name.unwrap_or("(unknown author)")
}

fn print_meme(card: &MemeCard) {
    let meme = &card.meme;
    println!(
        "[{}] {} · {}",
        meme.id,
        author_name(card.author.as_ref().map(|a| a.username.as_str())),
        relative_time(meme.created_at, Utc::now())
    );
    println!("  {}", meme.picture_url);
    for text in &meme.texts {
        println!("  \"{}\" at ({}, {})", text.content, text.x, text.y);
    }
    println!("  {}", meme.description);
    println!("  {} comments", meme.comments_count);
}

/// Splits `TEXT@X,Y` into its parts; a bare `TEXT` gets no position.
fn parse_caption(raw: &str) -> Result<(String, Option<(f64, f64)>), AppError> {
    let Some((text, position)) = raw.rsplit_once('@') else {
        return Ok((raw.to_string(), None));
    };
    let (x, y) = position
        .split_once(',')
        .ok_or_else(|| AppError::InvalidInput(format!("caption position must be X,Y: {}", raw)))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| AppError::InvalidInput(format!("caption position {}: {}", v, e)))
    };
    Ok((text.to_string(), Some((parse(x)?, parse(y)?))))
}
