//! # rb-client
//!
//! Line-oriented console over the review service. One `PostSynchronizer`
//! owns the view; account and post-creation commands go straight through
//! the HTTP client and trigger a refresh.

mod command;

use anyhow::Context;
use command::{parse, Command, HELP};
use configs::ClientSettings;
use rb_core::{DraftEdit, ErrorSink, Post, PostId, PostSynchronizer, ReviewDraft, SyncError};
use rb_http_client::HttpClient;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Prints every engine error for the person at the keyboard.
struct ConsoleSink;

impl ErrorSink for ConsoleSink {
    fn report(&self, error: &SyncError) {
        eprintln!("! {}", error);
    }
}

struct Console {
    client: Arc<HttpClient>,
    sync: PostSynchronizer,
}

impl Console {
    fn new(client: Arc<HttpClient>) -> Self {
        let sync = PostSynchronizer::new(client.clone(), client.clone(), Arc::new(ConsoleSink));
        Self { client, sync }
    }

    /// Runs one command. Returns `false` when the console should exit.
    async fn run(&self, command: Command) -> bool {
        match command {
            Command::Nothing => {}
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
            Command::Refresh => self.refresh().await,
            Command::Posts => self.print_posts(),
            Command::Rate(post_id, rating) => self.edit(post_id, DraftEdit::Rating(rating)),
            Command::Comment(post_id, text) => self.edit(post_id, DraftEdit::Content(text)),
            Command::Submit(post_id) => {
                // The engine already reported the error through the sink.
                if let Ok(aggregate) = self.sync.submit(post_id).await {
                    println!("saved. {}", rb_core::aggregate::label(&aggregate));
                }
            }
            Command::Login(credentials) => match self.client.login(&credentials).await {
                Ok(ack) => {
                    println!("{}", ack.message);
                    self.refresh().await;
                }
                Err(e) => eprintln!("! login failed: {}", e),
            },
            Command::Register(credentials) => match self.client.register(&credentials).await {
                Ok(done) => {
                    println!("{} (user {})", done.message, done.user_id);
                    self.refresh().await;
                }
                Err(e) => eprintln!("! register failed: {}", e),
            },
            Command::Logout => match self.client.logout().await {
                Ok(ack) => {
                    println!("{}", ack.message);
                    self.refresh().await;
                }
                Err(e) => eprintln!("! logout failed: {}", e),
            },
            Command::Create(post) => match self.client.create_post(&post).await {
                Ok(created) => {
                    println!("{} (post {})", created.message, created.post_id);
                    self.refresh().await;
                }
                Err(e) => eprintln!("! create failed: {}", e),
            },
        }
        true
    }

    async fn refresh(&self) {
        if let Ok(snapshot) = self.sync.refresh().await {
            let who = snapshot
                .current_user
                .map(|u| format!("signed in as user {}", u))
                .unwrap_or_else(|| "not signed in".to_string());
            println!("{} posts, {}", snapshot.posts.len(), who);
        }
    }

    fn edit(&self, post_id: PostId, edit: DraftEdit) {
        if self.sync.current_user().is_none() {
            eprintln!("! log in to review");
        } else if !self.sync.update_draft(post_id, edit) {
            eprintln!("! no post {}", post_id);
        }
    }

    fn print_posts(&self) {
        let posts = self.sync.posts();
        if posts.is_empty() {
            println!("no posts");
        }
        for post in &posts {
            let draft = self.sync.draft(post.id);
            println!(
                "{}",
                render_post(post, draft.as_ref(), self.sync.has_reviewed(post.id))
            );
        }
    }
}

fn render_post(post: &Post, draft: Option<&ReviewDraft>, reviewed: bool) -> String {
    let mut out = format!("#{} {}", post.id, post.title);
    if !post.location.is_empty() {
        out.push_str(&format!(" @ {}", post.location));
    }
    out.push_str(&format!(" by {}\n", post.author_username));
    if !post.description.is_empty() {
        out.push_str(&format!("    {}\n", post.description));
    }
    out.push_str(&format!("    {}\n", rb_core::aggregate::label(&post.reviews)));
    for review in post.reviews.by_recency() {
        out.push_str(&format!("      {} {}/5", review.username, review.rating));
        if !review.content.is_empty() {
            out.push_str(&format!(": {}", review.content));
        }
        out.push('\n');
    }
    if let Some(draft) = draft {
        let rating = draft
            .rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        let state = if reviewed { "your review" } else { "your draft" };
        out.push_str(&format!("    {}: {}/5 {:?}\n", state, rating, draft.content));
    }
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let settings = ClientSettings::load().context("loading client settings")?;
    let client = HttpClient::new(
        &settings.base_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let console = Console::new(Arc::new(client));
    tracing::info!(base_url = %settings.base_url, "rb-client connected");

    console.refresh().await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse(&line) {
            Ok(command) => {
                if !console.run(command).await {
                    break;
                }
            }
            Err(e) => eprintln!("! {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rb_core::{Review, UserId};

    fn post(reviews: Vec<Review>) -> Post {
        Post {
            id: 4,
            title: "Dunes".into(),
            description: "Sand".into(),
            location: "Coast".into(),
            author_username: "mia".into(),
            author_user_id: UserId::new("1"),
            created_at: Utc::now(),
            reviews: rb_core::aggregate::compute(&reviews),
        }
    }

    #[test]
    fn renders_aggregate_and_draft() {
        let review = Review {
            id: 1,
            user_id: UserId::new("2"),
            username: "ted".into(),
            rating: 4,
            content: "windy".into(),
            created_at: Utc::now(),
        };
        let draft = ReviewDraft::from_review(&review);
        let text = render_post(&post(vec![review]), Some(&draft), true);
        assert!(text.starts_with("#4 Dunes @ Coast by mia"));
        assert!(text.contains("4.0 (1 review)"));
        assert!(text.contains("ted 4/5: windy"));
        assert!(text.contains("your review: 4/5 \"windy\""));
    }

    #[test]
    fn anonymous_view_has_no_draft_line() {
        let text = render_post(&post(vec![]), None, false);
        assert!(text.contains(rb_core::aggregate::NO_RATINGS_LABEL));
        assert!(!text.contains("your"));
    }
}
