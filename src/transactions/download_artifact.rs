use std::{
    path::{Path, PathBuf},
    pin::pin,
};

use futures::TryStreamExt as _;
use reqwest::{
    Response,
    header::{CONTENT_LENGTH, HeaderMap},
};
#[cfg(feature = "digest")]
use sha2::Digest as _;
use tokio::{fs::File, io::AsyncWriteExt as _};
use tracing::{debug, error, info};

use crate::{
    client::GitHubClient,
    error::{Error, Result},
    progress::Progress,
};

/// The size of the chunks the body is written and reported in.
pub const CHUNK_SIZE: usize = 1024;

/// The states of one download. `Complete` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    RequestSent,
    StreamingBody,
    Complete,
    Failed,
}

impl State {
    fn enter(&mut self, next: Self, url: &str) {
        debug!("download of {url}: {self:?} -> {next:?}");
        *self = next;
    }
}

/// Where a download is written to, and how many bytes the server announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// The destination file.
    pub path: PathBuf,
    /// The `content-length` of the response, or 0 if it was absent.
    pub expected_len: u64,
}

impl DownloadTarget {
    /// The total to report progress against. [`None`] if the size is unknown.
    pub fn progress_total(&self) -> Option<u64> {
        (self.expected_len > 0).then_some(self.expected_len)
    }
}

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    /// The destination file.
    pub path: PathBuf,
    /// The number of bytes written, equal to the number of bytes received.
    pub bytes_written: u64,
    /// The `content-length` of the response, or 0 if it was absent.
    pub expected_len: u64,
}

/// Reads the `content-length` header, falling back to 0 if it is absent or malformed.
pub fn expected_len(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

/// Downloads `url` to `path`, overwriting any existing file, and reports every chunk written to
/// `progress`.
///
/// The file is only created once the server answered with a 2xx status. If the body can't be
/// read or written afterwards, the partial file is removed. Errors and logs name `url`, never
/// the storage URL the API redirects to. If `expected_sha256` is given and
/// the `digest` feature is enabled, the body is hashed while streaming and checked at the end.
///
/// # Errors
///
/// Returns [`Error::Http`] on a non-2xx status, [`Error::Request`] if the body stream breaks,
/// [`Error::Io`] if the file can't be created or written, or [`Error::DigestMismatch`] if the
/// downloaded bytes don't match `expected_sha256`.
pub async fn download_artifact<P, R>(
    client: &GitHubClient,
    url: &str,
    path: P,
    expected_sha256: Option<&str>,
    progress: &mut R,
) -> Result<Downloaded>
where
    P: AsRef<Path>,
    R: Progress + ?Sized,
{
    let path = path.as_ref();
    let mut state = State::Idle;

    debug!("requesting download from {url}…");
    state.enter(State::RequestSent, url);
    let response = match client.get(url, &[]).await {
        Ok(response) => response,
        Err(err) => {
            state.enter(State::Failed, url);
            error!("failed to request download from {url}: {err}");
            return Err(err);
        }
    };

    let target = DownloadTarget {
        path: path.to_owned(),
        expected_len: expected_len(response.headers()),
    };
    info!("downloading {url} to {}…", path.display());
    state.enter(State::StreamingBody, url);

    // Only a file this download created is removed on failure.
    let file = match File::create(path).await {
        Ok(file) => file,
        Err(err) => {
            state.enter(State::Failed, url);
            progress.abandon();
            let err = Error::io(path, err);
            error!("failed to download {url}: {err}");
            return Err(err);
        }
    };

    match write_body(url, file, response, &target, expected_sha256, progress).await {
        Ok(bytes_written) => {
            state.enter(State::Complete, url);
            progress.finish();
            info!("downloaded {bytes_written} bytes to {}", path.display());
            Ok(Downloaded {
                path: target.path,
                bytes_written,
                expected_len: target.expected_len,
            })
        }
        Err(err) => {
            state.enter(State::Failed, url);
            progress.abandon();
            error!("failed to download {url} to {}: {err}", path.display());
            drop(tokio::fs::remove_file(path).await);
            Err(err)
        }
    }
}

async fn write_body<R>(
    url: &str,
    mut file: File,
    response: Response,
    target: &DownloadTarget,
    expected_sha256: Option<&str>,
    progress: &mut R,
) -> Result<u64>
where
    R: Progress + ?Sized,
{
    progress.start(target.progress_total());

    #[cfg(feature = "digest")]
    let mut hasher = expected_sha256.map(|_| sha2::Sha256::new());

    let mut written: u64 = 0;
    let mut body = pin!(response.bytes_stream());
    while let Some(bytes) = body
        .try_next()
        .await
        .map_err(|err| Error::request(url, err))?
    {
        for chunk in bytes.chunks(CHUNK_SIZE) {
            file.write_all(chunk)
                .await
                .map_err(|err| Error::io(&target.path, err))?;
            #[cfg(feature = "digest")]
            if let Some(hasher) = &mut hasher {
                hasher.update(chunk);
            }

            let len = chunk.len() as u64;
            written += len;
            progress.advance(len);
        }
    }
    file.flush()
        .await
        .map_err(|err| Error::io(&target.path, err))?;

    #[cfg(feature = "digest")]
    if let (Some(hasher), Some(expected)) = (hasher, expected_sha256) {
        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(Error::DigestMismatch {
                expected: expected.to_owned(),
                actual,
            });
        }
        debug!("verified sha256:{actual} of {}", target.path.display());
    }
    #[cfg(not(feature = "digest"))]
    if expected_sha256.is_some() {
        tracing::warn!("digest verification requires the digest feature, skipping");
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{client::Token, config::Config};

    use reqwest::header::HeaderValue;
    use tokio::{
        io::{AsyncReadExt as _, AsyncWriteExt as _},
        net::TcpListener,
    };
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[derive(Debug, Default)]
    struct Recorder {
        total: Option<Option<u64>>,
        chunks: Vec<u64>,
        finished: bool,
        abandoned: bool,
    }

    impl Progress for Recorder {
        fn start(&mut self, total: Option<u64>) {
            self.total = Some(total);
        }

        fn advance(&mut self, bytes: u64) {
            self.chunks.push(bytes);
        }

        fn finish(&mut self) {
            self.finished = true;
        }

        fn abandon(&mut self) {
            self.abandoned = true;
        }
    }

    fn client(server: &MockServer) -> GitHubClient {
        let config = Config::new("octo", "app", "build.yml", "out").with_api_base(server.uri());
        GitHubClient::new(&config, &Token::new("t")).unwrap()
    }

    async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn body(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    /// Answers one connection per response with the given raw bytes, for responses wiremock
    /// can't produce.
    async fn serve_raw(responses: Vec<Vec<u8>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                socket.write_all(&response).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });
        format!("http://{addr}")
    }

    fn raw_client(base: &str) -> GitHubClient {
        let config = Config::new("octo", "app", "build.yml", "out").with_api_base(base);
        GitHubClient::new(&config, &Token::new("t")).unwrap()
    }

    #[tokio::test]
    async fn writes_every_byte_in_chunks() {
        let server = MockServer::start().await;
        let payload = body(3000);
        serve(
            &server,
            "/artifact/zip",
            ResponseTemplate::new(200).set_body_bytes(payload.clone()),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let mut progress = Recorder::default();

        let downloaded = download_artifact(
            &client(&server),
            &format!("{}/artifact/zip", server.uri()),
            &dest,
            None,
            &mut progress,
        )
        .await
        .unwrap();

        assert_eq!(downloaded.bytes_written, 3000);
        assert_eq!(downloaded.expected_len, 3000);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        assert_eq!(progress.total, Some(Some(3000)));
        assert_eq!(progress.chunks.iter().sum::<u64>(), 3000);
        assert!(progress.chunks.iter().all(|&len| len <= CHUNK_SIZE as u64));
        assert!(progress.finished);
    }

    #[tokio::test]
    async fn empty_body_creates_empty_file() {
        let server = MockServer::start().await;
        serve(&server, "/artifact/zip", ResponseTemplate::new(200)).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let mut progress = Recorder::default();

        let downloaded = download_artifact(
            &client(&server),
            &format!("{}/artifact/zip", server.uri()),
            &dest,
            None,
            &mut progress,
        )
        .await
        .unwrap();

        assert_eq!(downloaded.bytes_written, 0);
        assert!(std::fs::read(&dest).unwrap().is_empty());
        assert_eq!(progress.total, Some(None));
        assert!(progress.finished);
    }

    #[test]
    fn missing_content_length_is_unknown() {
        let mut headers = HeaderMap::new();
        assert_eq!(expected_len(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("not a number"));
        assert_eq!(expected_len(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("2048"));
        assert_eq!(expected_len(&headers), 2048);

        let unknown = DownloadTarget {
            path: PathBuf::from("out.zip"),
            expected_len: 0,
        };
        assert_eq!(unknown.progress_total(), None);
    }

    #[tokio::test]
    async fn not_found_leaves_no_file() {
        let server = MockServer::start().await;
        serve(&server, "/artifact/zip", ResponseTemplate::new(404)).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let mut progress = Recorder::default();

        let err = download_artifact(
            &client(&server),
            &format!("{}/artifact/zip", server.uri()),
            &dest,
            None,
            &mut progress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Http { status, .. } if status.as_u16() == 404));
        assert!(!dest.exists());
        assert_eq!(progress.total, None);
    }

    #[tokio::test]
    async fn follows_redirect_to_storage() {
        let server = MockServer::start().await;
        let payload = body(1500);
        serve(
            &server,
            "/artifact/zip",
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/storage/blob", server.uri()).as_str()),
        )
        .await;
        serve(
            &server,
            "/storage/blob",
            ResponseTemplate::new(200).set_body_bytes(payload.clone()),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");

        let downloaded = download_artifact(
            &client(&server),
            &format!("{}/artifact/zip", server.uri()),
            &dest,
            None,
            &mut crate::progress::Silent,
        )
        .await
        .unwrap();

        assert_eq!(downloaded.bytes_written, 1500);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/artifact/zip",
            ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        std::fs::write(&dest, b"an older and longer archive").unwrap();

        download_artifact(
            &client(&server),
            &format!("{}/artifact/zip", server.uri()),
            &dest,
            None,
            &mut crate::progress::Silent,
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[tokio::test]
    async fn missing_directory_is_io_error() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/artifact/zip",
            ResponseTemplate::new(200).set_body_bytes(b"zip".to_vec()),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing").join("out.zip");
        let mut progress = Recorder::default();

        let err = download_artifact(
            &client(&server),
            &format!("{}/artifact/zip", server.uri()),
            &dest,
            None,
            &mut progress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(progress.abandoned);
    }

    #[tokio::test]
    async fn unknown_length_streams_whole_body() {
        let payload = body(2500);
        let mut response = b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(&payload);
        let base = serve_raw(vec![response]).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let mut progress = Recorder::default();

        let downloaded = download_artifact(
            &raw_client(&base),
            &format!("{base}/artifact/zip"),
            &dest,
            None,
            &mut progress,
        )
        .await
        .unwrap();

        assert_eq!(downloaded.expected_len, 0);
        assert_eq!(downloaded.bytes_written, 2500);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        assert_eq!(progress.total, Some(None));
        assert_eq!(progress.chunks.iter().sum::<u64>(), 2500);
        assert!(progress.finished);
    }

    #[tokio::test]
    async fn broken_body_removes_partial_file_and_hides_storage_url() {
        let redirect = b"HTTP/1.1 302 Found\r\n\
            Location: /storage/blob?sig=secret\r\n\
            Content-Length: 0\r\n\
            Connection: close\r\n\r\n"
            .to_vec();
        let mut truncated =
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n".to_vec();
        truncated.extend_from_slice(&body(10));
        let base = serve_raw(vec![redirect, truncated]).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let mut progress = Recorder::default();

        let err = download_artifact(
            &raw_client(&base),
            &format!("{base}/artifact/zip"),
            &dest,
            None,
            &mut progress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Request { ref url, .. } if url.ends_with("/artifact/zip")));
        assert!(!err.to_string().contains("sig=secret"));
        assert!(!dest.exists());
        assert!(progress.abandoned);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn file_that_cannot_be_opened_is_kept() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/artifact/zip",
            ResponseTemplate::new(200).set_body_bytes(b"zip".to_vec()),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        std::fs::copy("/bin/sleep", &dest).unwrap();

        // A running executable can't be opened for writing.
        let mut child = None;
        for _ in 0..10 {
            match std::process::Command::new(&dest).arg("30").spawn() {
                Ok(spawned) => {
                    child = Some(spawned);
                    break;
                }
                Err(_) => std::thread::sleep(std::time::Duration::from_millis(50)),
            }
        }
        let mut child = child.unwrap();

        let result = download_artifact(
            &client(&server),
            &format!("{}/artifact/zip", server.uri()),
            &dest,
            None,
            &mut crate::progress::Silent,
        )
        .await;
        child.kill().unwrap();
        child.wait().unwrap();

        assert!(matches!(result, Err(Error::Io { .. })));
        assert!(dest.exists());
    }

    #[cfg(feature = "digest")]
    #[tokio::test]
    async fn verifies_digest() {
        use sha2::Digest as _;

        let server = MockServer::start().await;
        let payload = body(4096);
        serve(
            &server,
            "/artifact/zip",
            ResponseTemplate::new(200).set_body_bytes(payload.clone()),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let url = format!("{}/artifact/zip", server.uri());
        let digest = hex::encode(sha2::Sha256::digest(&payload));

        download_artifact(
            &client(&server),
            &url,
            &dest,
            Some(&digest),
            &mut crate::progress::Silent,
        )
        .await
        .unwrap();
        assert!(dest.exists());

        let err = download_artifact(
            &client(&server),
            &url,
            &dest,
            Some(&"0".repeat(64)),
            &mut crate::progress::Silent,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::DigestMismatch { actual, .. } if actual == digest));
        assert!(!dest.exists());
    }
}
