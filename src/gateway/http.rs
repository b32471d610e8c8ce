//! HTTP implementation of the network gateway
//!
//! Thin wrapper over reqwest: URL building, status checking and error
//! mapping. Transport failures map to network errors, body decode failures
//! to decode errors, 404s to not-found. A `success: false` acknowledgement
//! is treated as a server rejection.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::dto::{
    AckDto, CommentDto, CommentPageDto, CreateCommentBody, CreatePostBody, FeedPageDto,
    LikeResponseDto, PostDto, ReportBody, ShareResponseDto,
};
use crate::error::{EngineError, EngineResult};
use crate::gateway::NetworkGateway;

pub struct HttpNetworkGateway {
    client: Client,
    base_url: String,
}

impl HttpNetworkGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured client (timeouts, auth headers)
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: Response) -> EngineResult<Response> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(EngineError::NotFound(format!(
                "{} not found",
                response.url().path()
            )));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(EngineError::Network(format!("HTTP {}: {}", status, body)));
        }
        Ok(response)
    }

    fn require_ack(ack: AckDto, operation: &str) -> EngineResult<()> {
        if ack.success {
            Ok(())
        } else {
            Err(EngineError::Network(format!(
                "{operation} rejected by server"
            )))
        }
    }

    async fn post_ack(&self, path: &str, operation: &str) -> EngineResult<()> {
        let response = self.client.post(self.url(path)).send().await?;
        let ack = Self::check(response).await?.json::<AckDto>().await?;
        Self::require_ack(ack, operation)
    }

    async fn delete_ack(&self, path: &str, operation: &str) -> EngineResult<()> {
        let response = self.client.delete(self.url(path)).send().await?;
        let ack = Self::check(response).await?.json::<AckDto>().await?;
        Self::require_ack(ack, operation)
    }
}

#[async_trait]
impl NetworkGateway for HttpNetworkGateway {
    async fn list_posts(&self, page: i32, limit: i32) -> EngineResult<FeedPageDto> {
        debug!(page, limit, "listing posts");
        let response = self
            .client
            .get(self.url("/posts"))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn like_post(&self, post_id: &str) -> EngineResult<LikeResponseDto> {
        let response = self
            .client
            .post(self.url(&format!("/posts/{post_id}/like")))
            .send()
            .await?;
        let dto: LikeResponseDto = Self::check(response).await?.json().await?;
        if !dto.success {
            return Err(EngineError::Network("like rejected by server".to_string()));
        }
        Ok(dto)
    }

    async fn unlike_post(&self, post_id: &str) -> EngineResult<LikeResponseDto> {
        let response = self
            .client
            .delete(self.url(&format!("/posts/{post_id}/like")))
            .send()
            .await?;
        let dto: LikeResponseDto = Self::check(response).await?.json().await?;
        if !dto.success {
            return Err(EngineError::Network(
                "unlike rejected by server".to_string(),
            ));
        }
        Ok(dto)
    }

    async fn list_comments(
        &self,
        post_id: &str,
        page: i32,
        limit: i32,
    ) -> EngineResult<CommentPageDto> {
        let response = self
            .client
            .get(self.url(&format!("/posts/{post_id}/comments")))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn add_comment(
        &self,
        post_id: &str,
        body: &CreateCommentBody,
    ) -> EngineResult<CommentDto> {
        let response = self
            .client
            .post(self.url(&format!("/posts/{post_id}/comments")))
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_comment(&self, comment_id: &str) -> EngineResult<()> {
        self.delete_ack(&format!("/comments/{comment_id}"), "comment delete")
            .await
    }

    async fn like_comment(&self, comment_id: &str) -> EngineResult<LikeResponseDto> {
        let response = self
            .client
            .post(self.url(&format!("/comments/{comment_id}/like")))
            .send()
            .await?;
        let dto: LikeResponseDto = Self::check(response).await?.json().await?;
        if !dto.success {
            return Err(EngineError::Network(
                "comment like rejected by server".to_string(),
            ));
        }
        Ok(dto)
    }

    async fn unlike_comment(&self, comment_id: &str) -> EngineResult<LikeResponseDto> {
        let response = self
            .client
            .delete(self.url(&format!("/comments/{comment_id}/like")))
            .send()
            .await?;
        let dto: LikeResponseDto = Self::check(response).await?.json().await?;
        if !dto.success {
            return Err(EngineError::Network(
                "comment unlike rejected by server".to_string(),
            ));
        }
        Ok(dto)
    }

    async fn share_post(&self, post_id: &str) -> EngineResult<ShareResponseDto> {
        let response = self
            .client
            .post(self.url(&format!("/posts/{post_id}/share")))
            .send()
            .await?;
        let dto: ShareResponseDto = Self::check(response).await?.json().await?;
        if !dto.success {
            return Err(EngineError::Network("share rejected by server".to_string()));
        }
        Ok(dto)
    }

    async fn bookmark_post(&self, post_id: &str) -> EngineResult<()> {
        self.post_ack(&format!("/posts/{post_id}/bookmark"), "bookmark")
            .await
    }

    async fn unbookmark_post(&self, post_id: &str) -> EngineResult<()> {
        self.delete_ack(&format!("/posts/{post_id}/bookmark"), "bookmark removal")
            .await
    }

    async fn hide_post(&self, post_id: &str) -> EngineResult<()> {
        self.post_ack(&format!("/posts/{post_id}/hide"), "hide").await
    }

    async fn block_author(&self, author_id: &str) -> EngineResult<()> {
        self.post_ack(&format!("/authors/{author_id}/block"), "author block")
            .await
    }

    async fn unblock_author(&self, author_id: &str) -> EngineResult<()> {
        self.delete_ack(&format!("/authors/{author_id}/block"), "author unblock")
            .await
    }

    async fn report_post(&self, post_id: &str, reason: &str) -> EngineResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/posts/{post_id}/report")))
            .json(&ReportBody {
                reason: reason.to_string(),
            })
            .send()
            .await?;
        let ack = Self::check(response).await?.json::<AckDto>().await?;
        Self::require_ack(ack, "report")
    }

    async fn create_post(&self, body: &CreatePostBody) -> EngineResult<PostDto> {
        let response = self
            .client
            .post(self.url("/posts"))
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
