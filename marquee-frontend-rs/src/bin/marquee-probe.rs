//! Quick health probe for a Marquee resource store: counts each collection
//! and flags anything an operator would want to look at.

use anyhow::{Context, Result};

use marquee_frontend_rs::store::{MOVIE_REQUESTS, NOTIFICATIONS, REVIEWS, USERS};
use movie_utils::notifications::Notification;
use movie_utils::requests::MovieRequest;
use movie_utils::reviews::Review;
use movie_utils::User;
use tether::{Query, ResourceClient, StoreConfig};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(url) => StoreConfig::new(url.as_str()),
        None => StoreConfig::from_env(),
    };

    println!("probing {}", config.base_url);
    let client = ResourceClient::new(&config)?;

    let users: Vec<User> = client
        .list(USERS, &Query::new())
        .await
        .context("listing users")?;
    let suspended = users.iter().filter(|user| user.is_suspended()).count();
    let admins = users.iter().filter(|user| user.is_admin()).count();
    println!("users: {} ({admins} admin, {suspended} suspended)", users.len());

    let notifications: Vec<Notification> = client
        .list(NOTIFICATIONS, &Query::new())
        .await
        .context("listing notifications")?;
    let unread = notifications
        .iter()
        .filter(|notification| !notification.read)
        .count();
    println!(
        "notifications: {} ({unread} unread)",
        notifications.len()
    );

    let requests: Vec<MovieRequest> = client
        .list(MOVIE_REQUESTS, &Query::new())
        .await
        .context("listing movie requests")?;
    let pending = requests
        .iter()
        .filter(|request| !request.status.is_terminal())
        .count();
    println!("movie requests: {} ({pending} pending)", requests.len());

    let reviews: Vec<Review> = client
        .list(REVIEWS, &Query::new())
        .await
        .context("listing reviews")?;
    let flagged = reviews.iter().filter(|review| review.flagged).count();
    let flagged_replies: usize = reviews
        .iter()
        .map(|review| review.replies.iter().filter(|reply| reply.flagged).count())
        .sum();
    println!(
        "reviews: {} ({flagged} flagged, {flagged_replies} flagged replies)",
        reviews.len()
    );

    Ok(())
}
