//! Instruction text for the three generator call sites.

use crate::adapters::display_price;
use crate::config::ContentSettings;
use crate::domain::{preview, Topic};

/// Characters of the post body quoted in an image-prompt request
const IMAGE_CONTEXT_CHARS: usize = 200;

/// Trend discovery instruction, steering away from `recent` themes.
pub fn scout(content: &ContentSettings, price: Option<f64>, recent: &[String]) -> String {
    let region = &content.focus_region;
    let avoid = if recent.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nAVOID these recent themes: {}. Find different angles.",
            recent.join(", ")
        )
    };

    format!(
        "You are the SCOUT. Research the top {count} {subject}/crypto trends from the internet, X and social media. \
         PRIORITY: Focus heavily on the {region} market. Include: {region} influencers, regulatory news from {region}, \
         {region} exchanges, {region} celebrities backing crypto, {region}-based institutional adoption, local crypto \
         communities, local-currency trading trends. Also cover: influential global statements, price action, on-chain \
         data, ETF flows. Current {ticker}: {price}{avoid}. \
         Return JSON: [{{\"topic\":\"name\",\"who\":\"person or N/A\",\"statement\":\"what they said\",\"impact\":\"why it matters\"}}]. \
         Mix {region} and global topics ({share}% {region}-focused). Only JSON.",
        count = content.topic_count,
        subject = content.subject,
        ticker = content.ticker,
        price = display_price(price),
        share = content.focus_share,
    )
}

/// Batch post-writing instruction over all `topics`.
pub fn architect(content: &ContentSettings, topics: &[Topic], price: Option<f64>) -> String {
    let region = &content.focus_region;
    let topics_json = serde_json::to_string(topics).unwrap_or_else(|_| "[]".to_string());
    let quotes = (content.post_count + 1) / 2;
    let fresh = content.post_count - quotes;
    let min_len = content.max_post_length.min(200);

    format!(
        "You are the ARCHITECT. Create {count} viral X posts from these topics: {topics_json}. {ticker}: {price}. \
         REQUIREMENTS: 1) {share}% of posts should be {region}-focused (regulations, exchanges, influencers, \
         celebrities, adoption) 2) Mix influential quotes ({quotes}) and fresh trends ({fresh}) 3) Human \
         conversational style with personal opinions and analogies 4) Randomize length {min_len}-{max_len} chars \
         5) Use emojis and 3-5 hashtags 6) Include {region}-specific hashtags when relevant 7) Vary post sizes \
         naturally. Return JSON: [{{\"post\":\"text\"}}]. Only JSON.",
        count = content.post_count,
        ticker = content.ticker,
        price = display_price(price),
        share = content.focus_share,
        max_len = content.max_post_length,
    )
}

/// Companion visual instruction for one post.
pub fn image(content: &ContentSettings, post: &str, topic: &str) -> String {
    format!(
        "Create a detailed image prompt for: {topic}. Post: {post}. \
         Style: photorealistic, cyberpunk, {subject} symbols. Under 100 words. Return only the prompt.",
        post = preview(post, IMAGE_CONTEXT_CHARS),
        subject = content.subject,
    )
}
