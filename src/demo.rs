//! Sample data for running without a backend (`--demo`).

use chrono::{Duration, Utc};

use crate::api::MemoryGateway;
use crate::models::{Comment, CommentId, Post, PostId, ProfileId, ProfileRef};

/// Placeholder shown while a sample image loads
pub const SAMPLE_BLURHASH: &str = "|rF?hV%2WCj[ayj[a|j[az_NaeWBj@ayfRayfQfQM{M|azj[azf6fQfQfQIpWXofj[ayj[j[fQayWCoeoeaya}j[ayfQa{oLj?j[WVj[ayayj[fQoff7azayj[ayj[j[ayofayayayj[fQj[ayayj[ayfjj[j[ayjuayj[";

/// Profile the demo session posts and comments as
pub const DEMO_AUTHOR: &str = "demo-you";

const PROFILES: &[(&str, &str)] = &[
    ("demo-ana", "Ana Ribeiro"),
    ("demo-joao", "João Pereira"),
    ("demo-marta", "Marta Lopes"),
    ("demo-tiago", "Tiago Santos"),
    (DEMO_AUTHOR, "You"),
];

/// (author, minutes ago, description)
const POSTS: &[(&str, i64, &str)] = &[
    ("demo-ana", 12, "Morning light over the river. The fog lifted just in time."),
    ("demo-joao", 95, "Found this little bookshop on the way home."),
    ("demo-marta", 240, "Street market on Saturday. Bring cash, the cherries are worth it."),
    ("demo-tiago", 60 * 26, "First try at film photography."),
    ("demo-ana", 60 * 24 * 3, "Neighbourhood cleanup crew, thank you all!"),
    ("demo-joao", 60 * 24 * 9, ""),
];

/// (post index, author, minutes after the post, content)
const COMMENTS: &[(usize, &str, i64, &str)] = &[
    (0, "demo-joao", 3, "Gorgeous. Where is this?"),
    (0, "demo-ana", 5, "Just under the old bridge."),
    (0, "demo-marta", 9, "Need to go there this weekend"),
    (1, "demo-tiago", 20, "The one next to the bakery?"),
    (2, "demo-ana", 30, "The cherries really are worth it"),
    (4, "demo-tiago", 60, "Great turnout this year"),
];

/// (comment index, profile)
const LIKES: &[(usize, &str)] = &[
    (0, "demo-ana"),
    (0, "demo-marta"),
    (1, "demo-joao"),
    (4, "demo-joao"),
    (4, "demo-marta"),
    (4, "demo-tiago"),
];

fn avatar_url(id: &str) -> String {
    format!("https://i.pravatar.cc/150?u={}", urlencoding::encode(id))
}

fn image_url(seed: usize) -> String {
    format!("https://picsum.photos/seed/comuna-{seed}/300/420")
}

/// A backend seeded with a small community
#[must_use]
pub fn demo_gateway() -> MemoryGateway {
    let gateway = MemoryGateway::new();
    let now = Utc::now();

    for (id, name) in PROFILES {
        gateway.insert_profile(ProfileRef {
            id: ProfileId::new(*id),
            name: Some((*name).to_string()),
            avatar_url: Some(avatar_url(id)),
        });
    }

    let mut posts = Vec::with_capacity(POSTS.len());
    for (i, (author, minutes_ago, description)) in POSTS.iter().enumerate() {
        let post = Post {
            id: PostId::new(format!("demo-post-{}", i + 1)),
            created_at: now - Duration::minutes(*minutes_ago),
            image_url: image_url(i + 1),
            image_blurhash: Some(SAMPLE_BLURHASH.to_string()),
            description: (*description).to_string(),
            author: profile(author),
            comment_count: 0,
        };
        posts.push((post.id.clone(), post.created_at));
        gateway.insert_post(post);
    }

    let mut comment_ids = Vec::with_capacity(COMMENTS.len());
    for (i, (post_index, author, minutes_after, content)) in COMMENTS.iter().enumerate() {
        let (post_id, posted_at) = &posts[*post_index];
        let id = CommentId::new(format!("demo-comment-{}", i + 1));
        gateway.insert_comment(Comment {
            id: id.clone(),
            post_id: post_id.clone(),
            author: profile(author),
            content: (*content).to_string(),
            created_at: *posted_at + Duration::minutes(*minutes_after),
        });
        comment_ids.push(id);
    }

    for (comment_index, profile_id) in LIKES {
        gateway.like_comment(&comment_ids[*comment_index], &ProfileId::new(*profile_id));
    }

    tracing::debug!(
        "Seeded demo backend with {} posts and {} comments",
        POSTS.len(),
        COMMENTS.len()
    );
    gateway
}

fn profile(id: &str) -> ProfileRef {
    let name = PROFILES
        .iter()
        .find(|(pid, _)| *pid == id)
        .map(|(_, name)| (*name).to_string());
    ProfileRef {
        id: ProfileId::new(id),
        name,
        avatar_url: Some(avatar_url(id)),
    }
}
