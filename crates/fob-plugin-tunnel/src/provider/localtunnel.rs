//! localtunnel provider.
//!
//! Runs the `localtunnel` client (`lt`) as a child process and waits for it to
//! print its public URL. The client relays traffic for as long as it runs;
//! running clients are killed when the provider is dropped.

use super::{TunnelHandle, TunnelProvider, TunnelRequest};
use crate::error::TunnelError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace};

/// Binary installed by `npm install -g localtunnel`
const DEFAULT_PROGRAM: &str = "lt";

/// Default time to wait for the client to report its URL (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix the client prints before the public URL
const URL_MARKER: &str = "your url is:";

/// Lines of client stderr kept for error messages
const STDERR_TAIL_LINES: usize = 50;

/// Tunnel provider backed by the `localtunnel` CLI client.
#[derive(Debug)]
pub struct LocalTunnelCli {
    /// Program to run
    program: String,

    /// Arguments placed before the generated option flags
    /// (e.g. `["--yes", "localtunnel"]` when running through `npx`)
    args: Vec<String>,

    /// How long `open` may take, from spawn to URL or failure
    timeout: Duration,

    /// Clients that reported a URL and are still relaying
    children: Mutex<Vec<Child>>,
}

impl Default for LocalTunnelCli {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTunnelCli {
    /// Use the globally installed `lt` binary
    pub fn new() -> Self {
        Self::with_command(DEFAULT_PROGRAM, Vec::<String>::new())
    }

    /// Use a custom command, e.g. `npx --yes localtunnel`
    ///
    /// # Example
    ///
    /// ```rust
    /// use fob_plugin_tunnel::LocalTunnelCli;
    ///
    /// let provider = LocalTunnelCli::with_command("npx", ["--yes", "localtunnel"]);
    /// assert_eq!(provider.program(), "npx");
    /// ```
    pub fn with_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TIMEOUT,
            children: Mutex::new(Vec::new()),
        }
    }

    /// Set how long to wait for the client to report its URL
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of clients currently kept alive by this provider
    pub fn active_tunnels(&self) -> usize {
        self.children.lock().len()
    }

    /// Render the request as client flags.
    ///
    /// `port` comes first, then every option as `--kebab-key value`.
    /// `true` renders a bare flag; `false` and `null` are skipped.
    pub fn build_args(&self, request: &TunnelRequest) -> Result<Vec<String>, TunnelError> {
        let mut args = vec!["--port".to_string(), request.port.to_string()];

        for (key, value) in &request.options {
            if key.is_empty() || key.starts_with('-') || key.contains(char::is_whitespace) {
                return Err(TunnelError::invalid_option(key, "not a valid option name"));
            }

            let flag = option_flag(key);
            match value {
                Value::Null | Value::Bool(false) => {}
                Value::Bool(true) => args.push(flag),
                Value::String(s) => {
                    args.push(flag);
                    args.push(s.clone());
                }
                Value::Number(n) => {
                    args.push(flag);
                    args.push(n.to_string());
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(TunnelError::invalid_option(
                        key,
                        "nested values are not supported",
                    ));
                }
            }
        }

        Ok(args)
    }
}

/// Convert an option key to a CLI flag: `local_host` and `localHost` both
/// become `--local-host`.
fn option_flag(key: &str) -> String {
    let mut flag = String::with_capacity(key.len() + 4);
    flag.push_str("--");
    for (i, c) in key.chars().enumerate() {
        if c == '_' {
            flag.push('-');
        } else if c.is_ascii_uppercase() {
            if i > 0 {
                flag.push('-');
            }
            flag.push(c.to_ascii_lowercase());
        } else {
            flag.push(c);
        }
    }
    flag
}

/// Extract the public URL from a line of client output.
///
/// The client prints `your url is: https://<subdomain>.loca.lt`.
pub fn extract_tunnel_url(line: &str) -> Option<String> {
    let start = line.to_ascii_lowercase().find(URL_MARKER)? + URL_MARKER.len();
    let candidate = line[start..].split_whitespace().next()?;
    if candidate.starts_with("https://") || candidate.starts_with("http://") {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Read client stderr until it closes, logging each line and keeping the
/// last [`STDERR_TAIL_LINES`] for error messages.
fn drain_stderr(stderr: ChildStderr, tail: Arc<Mutex<VecDeque<String>>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    debug!(target: "fob::tunnel::client", "{}", line);
                    push_bounded(&mut tail.lock(), line);
                }
                Ok(None) => break,
                Err(err) => {
                    debug!(error = %err, "stopped reading tunnel client stderr");
                    break;
                }
            }
        }
    })
}

fn push_bounded(tail: &mut VecDeque<String>, line: String) {
    if tail.len() == STDERR_TAIL_LINES {
        tail.pop_front();
    }
    tail.push_back(line);
}

#[async_trait]
impl TunnelProvider for LocalTunnelCli {
    fn name(&self) -> &str {
        "localtunnel"
    }

    async fn open(&self, request: TunnelRequest) -> Result<TunnelHandle, TunnelError> {
        let args = self.build_args(&request)?;
        debug!(program = %self.program, ?args, "starting localtunnel client");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TunnelError::spawn_failed(&self.program, e))?;

        // stderr is drained from the start so a chatty client never blocks
        // on a full pipe before printing its URL
        let tail = Arc::new(Mutex::new(VecDeque::new()));
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| drain_stderr(stderr, Arc::clone(&tail)));

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TunnelError::no_url(&self.program, String::new()))?;
        let mut lines = BufReader::new(stdout).lines();

        // One deadline covers reading the URL and reaping a client that
        // closed stdout without reporting one
        let outcome = timeout(self.timeout, async {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        trace!(target: "fob::tunnel::client", "{}", line);
                        if let Some(url) = extract_tunnel_url(&line) {
                            return Ok(url);
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        debug!(error = %err, "stopped reading tunnel client stdout");
                        break;
                    }
                }
            }

            let status = child.wait().await;
            if let Some(task) = stderr_task {
                let _ = task.await;
            }
            let stderr = tail.lock().iter().cloned().collect::<Vec<_>>().join("\n");

            Err(match status.ok().and_then(|s| s.code()) {
                Some(code) if code != 0 => TunnelError::client_exited(code, stderr),
                _ => TunnelError::no_url(&self.program, stderr),
            })
        })
        .await;

        let url = match outcome {
            Ok(Ok(url)) => url,
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                if let Err(err) = child.start_kill() {
                    debug!(error = %err, "failed to kill timed out tunnel client");
                }
                return Err(TunnelError::timeout(self.timeout));
            }
        };

        // Keep draining stdout once the URL is known
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                trace!(target: "fob::tunnel::client", "{}", line);
            }
        });

        info!(url = %url, port = request.port, "localtunnel client connected");
        self.children.lock().push(child);
        Ok(TunnelHandle::new(self.name(), url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn request(options: Value) -> TunnelRequest {
        let options = match options {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        TunnelRequest { port: 9000, options }
    }

    #[test]
    fn test_extract_tunnel_url() {
        let url = extract_tunnel_url("your url is: https://miro-plugin-boilerplate.loca.lt");
        assert_eq!(url.as_deref(), Some("https://miro-plugin-boilerplate.loca.lt"));

        let url = extract_tunnel_url("Your URL is: https://abc.loca.lt  ");
        assert_eq!(url.as_deref(), Some("https://abc.loca.lt"));
    }

    #[test]
    fn test_extract_tunnel_url_negative() {
        assert!(extract_tunnel_url("").is_none());
        assert!(extract_tunnel_url("https://abc.loca.lt").is_none());
        assert!(extract_tunnel_url("your url is:").is_none());
        assert!(extract_tunnel_url("your url is: pending").is_none());
    }

    #[test]
    fn test_option_flag() {
        assert_eq!(option_flag("subdomain"), "--subdomain");
        assert_eq!(option_flag("local_host"), "--local-host");
        assert_eq!(option_flag("localHost"), "--local-host");
        assert_eq!(option_flag("allowInvalidCert"), "--allow-invalid-cert");
    }

    #[test]
    fn test_build_args_renders_options() {
        let provider = LocalTunnelCli::new();
        let args = provider
            .build_args(&request(json!({
                "subdomain": "demo",
                "host": "https://tunnel.example.com",
                "local_https": true,
                "print_requests": false,
                "local_host": null,
            })))
            .unwrap();

        assert_eq!(&args[..2], ["--port", "9000"]);
        assert!(args.windows(2).any(|w| w == ["--subdomain", "demo"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["--host", "https://tunnel.example.com"]));
        assert!(args.contains(&"--local-https".to_string()));
        assert!(!args.contains(&"--print-requests".to_string()));
        assert!(!args.contains(&"--local-host".to_string()));
    }

    #[test]
    fn test_build_args_rejects_nested_values() {
        let provider = LocalTunnelCli::new();
        let err = provider
            .build_args(&request(json!({ "headers": { "a": "b" } })))
            .unwrap_err();
        assert!(matches!(err, TunnelError::InvalidOption { ref key, .. } if key == "headers"));
    }

    #[test]
    fn test_build_args_rejects_bad_keys() {
        let provider = LocalTunnelCli::new();
        assert!(provider.build_args(&request(json!({ "--port": 1 }))).is_err());
        assert!(provider.build_args(&request(json!({ "two words": 1 }))).is_err());
    }

    #[test]
    fn test_with_command() {
        let provider = LocalTunnelCli::with_command("npx", ["--yes", "localtunnel"])
            .with_timeout(Duration::from_secs(5));
        assert_eq!(provider.program(), "npx");
        assert_eq!(provider.args, vec!["--yes", "localtunnel"]);
        assert_eq!(provider.timeout(), Duration::from_secs(5));
        assert_eq!(provider.active_tunnels(), 0);
    }

    #[tokio::test]
    async fn test_open_missing_binary() {
        let provider = LocalTunnelCli::with_command("fob_tunnel_nonexistent_binary_12345", Vec::<String>::new());
        let err = provider.open(request(json!({}))).await.unwrap_err();
        assert!(matches!(err, TunnelError::SpawnFailed { .. }));
        assert_eq!(provider.active_tunnels(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_reads_url() {
        let provider = LocalTunnelCli::with_command(
            "sh",
            ["-c", "echo 'your url is: https://demo.loca.lt'; sleep 5", "lt"],
        );
        let handle = provider
            .open(request(json!({ "subdomain": "demo" })))
            .await
            .unwrap();

        assert_eq!(handle.url(), "https://demo.loca.lt");
        assert_eq!(handle.provider(), "localtunnel");
        assert_eq!(provider.active_tunnels(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_client_exits() {
        let provider =
            LocalTunnelCli::with_command("sh", ["-c", "echo ECONNREFUSED >&2; exit 3", "lt"]);
        let err = provider.open(request(json!({}))).await.unwrap_err();

        match err {
            TunnelError::ClientExited { exit_code, stderr } => {
                assert_eq!(exit_code, 3);
                assert!(stderr.contains("ECONNREFUSED"), "got: {}", stderr);
            }
            other => panic!("expected ClientExited, got {:?}", other),
        }
        assert_eq!(provider.active_tunnels(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_times_out() {
        let provider = LocalTunnelCli::with_command("sh", ["-c", "sleep 5", "lt"])
            .with_timeout(Duration::from_millis(100));
        let err = provider.open(request(json!({}))).await.unwrap_err();
        assert!(matches!(err, TunnelError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_times_out_when_client_closes_stdout_and_keeps_running() {
        let provider = LocalTunnelCli::with_command("sh", ["-c", "exec >&-; sleep 5", "lt"])
            .with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = provider.open(request(json!({}))).await.unwrap_err();

        assert!(matches!(err, TunnelError::Timeout { .. }), "got {:?}", err);
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "open took {:?}",
            started.elapsed()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_survives_noisy_stderr() {
        // Well past a pipe buffer of warnings before the URL
        let provider = LocalTunnelCli::with_command(
            "sh",
            [
                "-c",
                "yes 'warning: retrying connection' | head -c 262144 >&2; \
                 echo 'your url is: https://noisy.loca.lt'; exec sleep 5",
                "lt",
            ],
        )
        .with_timeout(Duration::from_secs(10));

        let handle = provider.open(request(json!({}))).await.unwrap();
        assert_eq!(handle.url(), "https://noisy.loca.lt");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_keeps_stderr_read_before_invalid_output() {
        let provider = LocalTunnelCli::with_command(
            "sh",
            ["-c", "printf 'tunnel server offline\\n\\377\\377\\n' >&2; exit 2", "lt"],
        );
        let err = provider.open(request(json!({}))).await.unwrap_err();

        match err {
            TunnelError::ClientExited { exit_code, stderr } => {
                assert_eq!(exit_code, 2);
                assert_eq!(stderr, "tunnel server offline");
            }
            other => panic!("expected ClientExited, got {:?}", other),
        }
    }

    #[test]
    fn test_stderr_tail_is_bounded() {
        let mut tail = VecDeque::new();
        for i in 0..STDERR_TAIL_LINES + 5 {
            push_bounded(&mut tail, format!("line {}", i));
        }

        assert_eq!(tail.len(), STDERR_TAIL_LINES);
        assert_eq!(tail.front().map(String::as_str), Some("line 5"));
    }
}
