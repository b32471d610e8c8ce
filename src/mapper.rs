//! Pure translation from wire DTOs to domain entities
//!
//! No state beyond the viewer id, no side effects. Fallback policy: an
//! unrecognized post type string maps to an author post and an unrecognized
//! media type maps to an image. Both are documented ambiguities of the
//! backend contract, kept explicit here rather than rejected.

use crate::dto::{AuthorDto, CommentDto, FeedPageDto, MediaDto, PostDto};
use crate::models::{Author, Comment, FeedPage, MediaItem, MediaKind, Post, PostBody};

#[derive(Debug, Clone)]
pub struct ResponseMapper {
    viewer_id: String,
}

impl ResponseMapper {
    pub fn new(viewer_id: impl Into<String>) -> Self {
        Self {
            viewer_id: viewer_id.into(),
        }
    }

    pub fn map_page(&self, dto: FeedPageDto) -> FeedPage {
        FeedPage {
            posts: dto.data.into_iter().map(|p| self.map_post(p)).collect(),
            total: dto.total,
            page: dto.page,
            has_more: dto.has_more,
        }
    }

    pub fn map_post(&self, dto: PostDto) -> Post {
        let body = match dto.post_type.as_deref() {
            Some("user") => PostBody::User {
                user: dto.user.map(map_author).unwrap_or_else(placeholder_author),
                content: dto.content.unwrap_or_default(),
                media: dto.media.into_iter().map(map_media).collect(),
            },
            // Unknown post type strings fall back to the author variant.
            _ => PostBody::Author {
                author: dto.author.map(map_author).unwrap_or_else(placeholder_author),
                quote: dto.quote.unwrap_or_default(),
            },
        };

        let mut comments: Vec<Comment> = dto
            .comments
            .unwrap_or_default()
            .into_iter()
            .map(|c| self.map_comment(c))
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut post = Post {
            id: dto.id,
            body,
            like_count: dto.like_count.max(0),
            comment_count: dto.comment_count.max(0),
            share_count: dto.share_count.max(0),
            is_liked: dto.is_liked,
            is_bookmarked: dto.is_bookmarked,
            has_viewer_comment: false,
            comments,
            created_at: dto.created_at,
        };
        post.recompute_viewer_comment(&self.viewer_id);
        post
    }

    pub fn map_comment(&self, dto: CommentDto) -> Comment {
        Comment {
            id: dto.id,
            post_id: dto.post_id,
            user_id: dto.user_id,
            user_name: dto.user_name,
            content: dto.content,
            created_at: dto.created_at,
            like_count: dto.like_count.max(0),
            is_liked: dto.is_liked,
            reply_to_id: dto.reply_to_id,
            reply_to_user_name: dto.reply_to_user_name,
        }
    }
}

fn map_author(dto: AuthorDto) -> Author {
    Author {
        id: dto.id,
        name: dto.name,
        avatar_url: dto.avatar_url,
    }
}

fn map_media(dto: MediaDto) -> MediaItem {
    let kind = match dto.media_type.as_deref() {
        Some("video") => MediaKind::Video,
        // Unknown media type strings fall back to image.
        _ => MediaKind::Image,
    };
    MediaItem {
        id: dto.id,
        kind,
        url: dto.url,
    }
}

fn placeholder_author() -> Author {
    Author {
        id: String::new(),
        name: String::new(),
        avatar_url: None,
    }
}
