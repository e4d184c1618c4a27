//! Chunked POST uploads.
//!
//! The file is sent in sequential fixed-size chunks to the endpoint named by
//! an upload ticket, then the ticket is completed to obtain the video id.
//! There is no resume: on failure the caller restarts the whole upload.

use crate::decode::ResponseFormat;
use crate::error::{Result, VimeoError};
use crate::oauth::{Signer, Token};
use crate::vimeo::client::{VimeoClient, status_error};
use crate::vimeo::models::{CompletedUpload, UploadQuota, UploadTicket};
use reqwest::{Method, Url};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info};

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Progress callback: `(bytes sent so far, total bytes)`.
pub type Progress<'p> = &'p mut (dyn FnMut(u64, u64) + Send);

/// An upload in progress.
///
/// Dropping the session abandons the upload; nothing is sent to the
/// service in that case.
#[derive(Debug)]
pub struct UploadSession<'a> {
    client: &'a VimeoClient,
    token: Token,
    file: File,
    file_name: String,
    total_bytes: u64,
    chunk_size: usize,
    ticket: UploadTicket,
    quota: UploadQuota,
    bytes_sent: u64,
    chunks_sent: u64,
}

impl VimeoClient {
    /// Open `path`, check quota and obtain an upload ticket.
    ///
    /// # Arguments
    /// * `path` - File to upload
    /// * `chunk_size` - Bytes per chunk, must be greater than zero
    ///
    /// # Returns
    /// * `Result<UploadSession>` - Session ready to send its first chunk
    ///
    /// # Details
    /// Requires an access token. Fails with [`VimeoError::InsufficientQuota`]
    /// when the file exceeds the free upload space, before any chunk is sent.
    pub async fn start_upload(&self, path: impl AsRef<Path>, chunk_size: usize) -> Result<UploadSession<'_>> {
        let path = path.as_ref();
        self.require_consumer()?;
        let token = self
            .access_token()
            .cloned()
            .ok_or_else(|| VimeoError::invalid_state("uploading requires an access token"))?;
        if chunk_size == 0 {
            return Err(VimeoError::invalid_input("chunk size must be greater than zero"));
        }

        let file = File::open(path).await?;
        let total_bytes = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| VimeoError::invalid_input(format!("{} has no file name", path.display())))?;

        let quota: UploadQuota = self
            .call("videos.upload.getQuota")
            .format(ResponseFormat::Json)
            .require_user_token()
            .send()
            .await?
            .deserialize()?;
        if total_bytes > quota.upload_space.free {
            return Err(VimeoError::InsufficientQuota {
                needed: total_bytes,
                available: quota.upload_space.free,
            });
        }

        let ticket: UploadTicket = self
            .call("videos.upload.getTicket")
            .param("upload_method", "post")
            .format(ResponseFormat::Json)
            .require_user_token()
            .send()
            .await?
            .deserialize()?;
        if let Some(max) = ticket.max_file_size
            && total_bytes > max
        {
            return Err(VimeoError::invalid_input(format!(
                "{} is {} bytes, the upload ticket allows at most {}",
                file_name, total_bytes, max
            )));
        }

        debug!(ticket = %ticket.id, file = %file_name, total_bytes, chunk_size, "upload started");

        Ok(UploadSession {
            client: self,
            token,
            file,
            file_name,
            total_bytes,
            chunk_size,
            ticket,
            quota,
            bytes_sent: 0,
            chunks_sent: 0,
        })
    }

    /// Upload a whole file and return the new video's id.
    ///
    /// # Arguments
    /// * `path` - File to upload
    /// * `chunk_size` - Bytes per chunk
    /// * `progress` - Optional callback invoked after each chunk
    ///
    /// # Returns
    /// * `Result<String>` - Id of the uploaded video
    ///
    /// # Details
    /// Sends `ceil(size / chunk_size)` chunks in order, then completes the
    /// ticket. A failed chunk aborts the upload without completing it.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        chunk_size: usize,
        progress: Option<Progress<'_>>,
    ) -> Result<String> {
        self.start_upload(path, chunk_size)
            .await?
            .upload_all(progress)
            .await
    }
}

impl UploadSession<'_> {
    pub fn ticket(&self) -> &UploadTicket {
        &self.ticket
    }

    pub fn quota(&self) -> &UploadQuota {
        &self.quota
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn chunks_sent(&self) -> u64 {
        self.chunks_sent
    }

    pub fn is_finished(&self) -> bool {
        self.bytes_sent >= self.total_bytes
    }

    /// Send the next chunk.
    ///
    /// # Returns
    /// * `Result<Option<u64>>` - Bytes sent so far, or `None` when the whole
    ///   file has already been sent
    ///
    /// # Details
    /// Each chunk is read from the file offset of the bytes already
    /// acknowledged, so calling again after a failed chunk resends that same
    /// chunk under the same chunk id.
    pub async fn send_next_chunk(&mut self) -> Result<Option<u64>> {
        if self.is_finished() {
            return Ok(None);
        }
        let remaining = self.total_bytes - self.bytes_sent;
        let len = usize::try_from(remaining).map_or(self.chunk_size, |r| r.min(self.chunk_size));
        let chunk = self.read_chunk(len).await?;

        self.post_chunk(chunk).await?;
        self.bytes_sent += len as u64;
        self.chunks_sent += 1;
        debug!(
            ticket = %self.ticket.id,
            chunk = self.chunks_sent,
            sent = self.bytes_sent,
            total = self.total_bytes,
            "chunk uploaded"
        );
        Ok(Some(self.bytes_sent))
    }

    /// Send every remaining chunk, then complete the upload.
    pub async fn upload_all(mut self, mut progress: Option<Progress<'_>>) -> Result<String> {
        while let Some(sent) = self.send_next_chunk().await? {
            if let Some(callback) = progress.as_deref_mut() {
                callback(sent, self.total_bytes);
            }
        }
        self.complete().await
    }

    /// Finalize the ticket and return the new video's id.
    pub async fn complete(self) -> Result<String> {
        if !self.is_finished() {
            return Err(VimeoError::invalid_state(format!(
                "upload incomplete: {} of {} bytes sent",
                self.bytes_sent, self.total_bytes
            )));
        }
        let completed: CompletedUpload = self
            .client
            .call("videos.upload.complete")
            .param("ticket_id", &self.ticket.id)
            .param("filename", &self.file_name)
            .format(ResponseFormat::Json)
            .require_user_token()
            .send()
            .await?
            .deserialize()?;
        info!(
            video_id = %completed.video_id,
            bytes = self.total_bytes,
            chunks = self.chunks_sent,
            "upload complete"
        );
        Ok(completed.video_id)
    }

    async fn read_chunk(&mut self, len: usize) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(self.bytes_sent)).await?;
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.file.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(VimeoError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("{} shrank during upload", self.file_name),
                )));
            }
            filled += n;
        }
        Ok(buf)
    }

    // `ticket_id` and `chunk_id` travel in the query string so they are
    // covered by the signature; the multipart chunk bytes are not.
    async fn post_chunk(&self, chunk: Vec<u8>) -> Result<()> {
        let consumer = self.client.require_consumer()?;
        let mut url = Url::parse(&self.ticket.endpoint).map_err(|e| {
            VimeoError::invalid_input(format!("Invalid upload endpoint {}: {}", self.ticket.endpoint, e))
        })?;
        url.query_pairs_mut()
            .append_pair("ticket_id", &self.ticket.id)
            .append_pair("chunk_id", &self.chunks_sent.to_string());

        let authorization = Signer::new(consumer, Some(&self.token)).authorization_header(
            Method::POST.as_str(),
            url.as_str(),
            &[],
            &[],
        )?;

        let form = Form::new().part("file_data", Part::bytes(chunk).file_name(self.file_name.clone()));

        let response = self
            .client
            .http
            .post(url)
            .header(AUTHORIZATION, authorization)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(status_error(status, &body));
        }
        Ok(())
    }
}
