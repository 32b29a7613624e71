use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::extract::Extractor;
use crate::report::Report;
use crate::settings::Settings;

/// HTTP client for mint pages. One attempt per URL, no retries.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Fetcher { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<String, ExtractError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::FetchFailed(format!("HTTP {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ExtractError::FetchFailed(e.to_string()))?;
        debug!(
            url,
            bytes = html.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );
        require_document(html, url)
    }
}

/// Local documents for the `file` command. Stdin (`-`) is read at most once
/// and shared by every `-` argument.
pub struct LocalDocuments {
    stdin: Option<Result<String, ExtractError>>,
}

impl LocalDocuments {
    pub fn new(paths: &[PathBuf]) -> Self {
        let stdin = paths
            .iter()
            .any(|p| is_stdin(p))
            .then(|| read_from(std::io::stdin().lock(), "stdin"));
        LocalDocuments { stdin }
    }

    pub fn read(&self, path: &Path) -> Result<String, ExtractError> {
        if is_stdin(path) {
            return match &self.stdin {
                Some(doc) => doc.clone(),
                None => read_from(std::io::stdin().lock(), "stdin"),
            };
        }
        let label = path.display().to_string();
        let html = std::fs::read_to_string(path)
            .map_err(|e| ExtractError::FetchFailed(format!("{}: {}", label, e)))?;
        require_document(html, &label)
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_from<R: Read>(mut reader: R, label: &str) -> Result<String, ExtractError> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|e| ExtractError::FetchFailed(format!("{}: {}", label, e)))?;
    require_document(buf, label)
}

/// Blank document upstream counts as a failed fetch; extraction is not attempted.
fn require_document(html: String, source: &str) -> Result<String, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::FetchFailed(format!("empty document from {}", source)));
    }
    Ok(html)
}

pub async fn fetch_and_extract(fetcher: &Fetcher, extractor: &Extractor, url: &str) -> Report {
    match fetcher.fetch(url).await {
        Ok(html) => extractor.extract(&html).into(),
        Err(e) => {
            warn!("Fetch failed for {}: {}", url, e);
            e.into()
        }
    }
}

pub struct BatchStats {
    pub total: usize,
    pub found: usize,
    pub empty: usize,
    pub errors: usize,
}

/// Fetch and extract URLs concurrently, handing each report to `on_report`
/// as it arrives (completion order, not input order).
pub async fn run_batch<F>(
    fetcher: Arc<Fetcher>,
    extractor: Arc<Extractor>,
    urls: Vec<String>,
    concurrency: usize,
    mut on_report: F,
) -> Result<BatchStats>
where
    F: FnMut(&str, &Report),
{
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let total = urls.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<(String, Report)>(concurrency * 2);

    for url in urls {
        let fetcher = Arc::clone(&fetcher);
        let extractor = Arc::clone(&extractor);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let report = fetch_and_extract(&fetcher, &extractor, &url).await;
            let _ = tx.send((url, report)).await;
        });
    }

    // rx closes once every task has dropped its sender
    drop(tx);

    let mut stats = BatchStats {
        total,
        found: 0,
        empty: 0,
        errors: 0,
    };

    while let Some((url, report)) = rx.recv().await {
        match &report {
            Report::Success(x) if x.best_guess.is_some() => stats.found += 1,
            Report::Success(_) => stats.empty += 1,
            Report::Failure(_) => stats.errors += 1,
        }
        pb.suspend(|| on_report(&url, &report));
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Processed {} pages ({} with address, {} without, {} errors)",
        stats.total, stats.found, stats.empty, stats.errors
    );

    Ok(stats)
}

/// Parse a URL list: one per line, blank lines and `#` comments skipped.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_list_skips_comments_and_blanks() {
        let urls = parse_url_list("# drops\nhttps://a.xyz/mint\n\n  https://b.xyz  \n#https://c.xyz\n");
        assert_eq!(urls, vec!["https://a.xyz/mint", "https://b.xyz"]);
    }

    #[test]
    fn blank_document_is_fetch_failure() {
        let err = require_document("  \n\t".into(), "page").unwrap_err();
        assert!(matches!(err, ExtractError::FetchFailed(_)));
        assert_eq!(require_document("<p/>".into(), "page").unwrap(), "<p/>");
    }

    const MINT_HTML: &str =
        "<p>Mint contract: 0x1111111111111111111111111111111111111111</p>";

    #[test]
    fn read_fixture_document() {
        let docs = LocalDocuments::new(&[PathBuf::from("tests/fixtures/mint_page.html")]);
        assert!(docs.stdin.is_none());
        let html = docs.read(Path::new("tests/fixtures/mint_page.html")).unwrap();
        assert!(html.contains("contractAddress"));
    }

    #[test]
    fn missing_file_is_fetch_failure() {
        let docs = LocalDocuments { stdin: None };
        let err = docs.read(Path::new("tests/fixtures/nope.html")).unwrap_err();
        assert!(matches!(err, ExtractError::FetchFailed(m) if m.contains("nope.html")));
    }

    #[test]
    fn repeated_stdin_gets_same_document() {
        let docs = LocalDocuments {
            stdin: Some(read_from(MINT_HTML.as_bytes(), "stdin")),
        };
        let first = docs.read(Path::new("-")).unwrap();
        let second = docs.read(Path::new("-")).unwrap();
        assert_eq!(first, MINT_HTML);
        assert_eq!(first, second);
    }

    #[test]
    fn blank_stdin_is_fetch_failure() {
        let err = read_from(&b" \n "[..], "stdin").unwrap_err();
        assert!(matches!(err, ExtractError::FetchFailed(m) if m.contains("stdin")));
    }

    /// Minimal HTTP/1.1 server on an ephemeral port, routing on the request path.
    async fn serve_pages() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = sock.read(&mut buf).await.unwrap_or(0);
                    let req = String::from_utf8_lossy(&buf[..n]);
                    let path = req.split_whitespace().nth(1).unwrap_or("/");
                    let (status, body) = match path {
                        "/mint" => ("200 OK", MINT_HTML),
                        "/sold-out" => ("200 OK", "<p>Sold out</p>"),
                        "/empty" => ("200 OK", ""),
                        _ => ("404 Not Found", "not found"),
                    };
                    let resp = format!(
                        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = sock.write_all(resp.as_bytes()).await;
                    let _ = sock.shutdown().await;
                });
            }
        });
        format!("http://{}", addr)
    }

    fn test_fetcher() -> Fetcher {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        Fetcher { client }
    }

    fn assert_fetch_failure(report: &Report) {
        match report {
            Report::Failure(f) => assert_eq!(f.error, "Failed to fetch page"),
            other => panic!("expected fetch failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn not_found_is_fetch_failure() {
        let base = serve_pages().await;
        let report =
            fetch_and_extract(&test_fetcher(), &Extractor::default(), &format!("{}/gone", base))
                .await;
        assert_fetch_failure(&report);
        if let Report::Failure(f) = &report {
            assert!(f.message.as_deref().unwrap_or("").contains("404"));
        }
    }

    #[tokio::test]
    async fn empty_body_is_fetch_failure() {
        let base = serve_pages().await;
        let report =
            fetch_and_extract(&test_fetcher(), &Extractor::default(), &format!("{}/empty", base))
                .await;
        assert_fetch_failure(&report);
    }

    #[tokio::test]
    async fn fetched_page_is_extracted() {
        let base = serve_pages().await;
        let report =
            fetch_and_extract(&test_fetcher(), &Extractor::default(), &format!("{}/mint", base))
                .await;
        match report {
            Report::Success(x) => assert_eq!(
                x.best_guess.as_deref(),
                Some("0x1111111111111111111111111111111111111111")
            ),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn batch_counts_each_outcome() {
        let base = serve_pages().await;
        let urls: Vec<String> = ["/mint", "/mint", "/sold-out", "/empty", "/gone"]
            .iter()
            .map(|p| format!("{}{}", base, p))
            .collect();

        let mut seen = Vec::new();
        let stats = run_batch(
            Arc::new(test_fetcher()),
            Arc::new(Extractor::default()),
            urls.clone(),
            2,
            |url, report| seen.push((url.to_string(), report.is_success())),
        )
        .await
        .unwrap();

        assert_eq!(stats.total, 5);
        assert_eq!(stats.found, 2);
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.errors, 2);

        seen.sort();
        let mut want: Vec<(String, bool)> = urls
            .into_iter()
            .map(|u| {
                let ok = !(u.ends_with("/empty") || u.ends_with("/gone"));
                (u, ok)
            })
            .collect();
        want.sort();
        assert_eq!(seen, want);
    }

    #[tokio::test]
    async fn unreachable_host_is_fetch_failure() {
        let fetcher = Fetcher::new(&Settings {
            timeout_secs: 2,
            ..Settings::default()
        })
        .unwrap();
        let report =
            fetch_and_extract(&fetcher, &Extractor::default(), "http://127.0.0.1:9/mint").await;
        assert!(!report.is_success());
    }
}
