//! Scan-to-verify flow: read a code, release the reader, ask the backend
//! whether the item belongs to the task.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info, instrument, warn};

use crate::errors::{localize_server_error, ServiceError};
use crate::gateway::VerificationGateway;
use crate::models::{ScanResult, ScanVerifyRequest};
use crate::services::barcode::{parse_item_id, UNRECOGNIZED_CODE};

pub const VERIFY_SUCCESS: &str = "驗證成功";
pub const VERIFY_FAILED: &str = "驗證失敗";
pub const VERIFY_ERROR: &str = "驗證時發生錯誤";

/// A source of decoded barcode or QR text: a camera decoder, a keyboard
/// wedge scanner, a test script.
#[async_trait]
pub trait CodeReader: Send {
    /// Powers up the underlying device or stream.
    async fn start(&mut self) -> Result<(), ServiceError>;

    /// Waits for the next decoded code. `None` means the source is exhausted.
    async fn next_code(&mut self) -> Result<Option<String>, ServiceError>;

    /// Releases the device. Must be safe to call more than once.
    fn stop(&mut self);
}

/// Exclusive, started access to a [`CodeReader`]. Dropping the guard stops
/// the reader, whichever way the scan ended.
pub struct ReaderGuard<'a, R: CodeReader + ?Sized> {
    reader: &'a mut R,
}

impl<'a, R: CodeReader + ?Sized> ReaderGuard<'a, R> {
    pub async fn acquire(reader: &'a mut R) -> Result<ReaderGuard<'a, R>, ServiceError> {
        if let Err(err) = reader.start().await {
            reader.stop();
            return Err(err);
        }
        Ok(Self { reader })
    }

    pub async fn next_code(&mut self) -> Result<Option<String>, ServiceError> {
        self.reader.next_code().await
    }
}

impl<R: CodeReader + ?Sized> Drop for ReaderGuard<'_, R> {
    fn drop(&mut self) {
        self.reader.stop();
        debug!("Code reader released");
    }
}

/// Reads one code per line, the way a keyboard wedge scanner types into a
/// terminal. Blank lines are ignored.
pub struct LineCodeReader<R> {
    lines: Lines<R>,
    active: bool,
}

impl<R: AsyncBufRead + Unpin + Send> LineCodeReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl LineCodeReader<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> CodeReader for LineCodeReader<R> {
    async fn start(&mut self) -> Result<(), ServiceError> {
        self.active = true;
        Ok(())
    }

    async fn next_code(&mut self) -> Result<Option<String>, ServiceError> {
        if !self.active {
            return Err(ServiceError::InvalidOperation("掃描器未啟動".to_string()));
        }
        while let Some(line) = self.lines.next_line().await? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn stop(&mut self) {
        self.active = false;
    }
}

/// One operator's scanning session against a single task.
pub struct ScanSession<R: CodeReader> {
    task_id: String,
    reader: R,
    gateway: Arc<dyn VerificationGateway>,
    last_result: Option<ScanResult>,
}

impl<R: CodeReader> ScanSession<R> {
    pub fn new(task_id: impl Into<String>, reader: R, gateway: Arc<dyn VerificationGateway>) -> Self {
        Self {
            task_id: task_id.into(),
            reader,
            gateway,
            last_result: None,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn last_result(&self) -> Option<&ScanResult> {
        self.last_result.as_ref()
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Waits for one code and verifies it. The reader is paused before the
    /// verification request goes out. Returns `None` once the reader has no
    /// more codes.
    #[instrument(skip(self), fields(task_id = %self.task_id))]
    pub async fn scan_once(&mut self) -> Result<Option<ScanResult>, ServiceError> {
        if self.last_result.is_some() {
            return Err(ServiceError::InvalidOperation(
                "請先清除上一次結果再掃描".to_string(),
            ));
        }

        let code = {
            let mut guard = ReaderGuard::acquire(&mut self.reader).await?;
            guard.next_code().await?
        };

        let Some(code) = code else {
            return Ok(None);
        };

        let result = self.verify_code(&code).await;
        self.last_result = Some(result.clone());
        Ok(Some(result))
    }

    /// Clears the last verdict so the next scan can start.
    pub fn retry(&mut self) {
        self.last_result = None;
    }

    /// Parses and verifies one scanned text. Every failure ends up as a
    /// rejected result with an operator-facing message.
    #[instrument(skip(self), fields(task_id = %self.task_id))]
    pub async fn verify_code(&self, raw_text: &str) -> ScanResult {
        let Some(item_id) = parse_item_id(raw_text) else {
            debug!(raw_text, "Unrecognized code");
            return ScanResult::rejected(raw_text, None, UNRECOGNIZED_CODE);
        };

        let request = ScanVerifyRequest {
            item_id: item_id.clone(),
            task_id: self.task_id.clone(),
        };

        match self.gateway.verify_scan(&request).await {
            Ok(response) if response.is_verified => {
                info!(item_id = %item_id, "Item verified");
                ScanResult::verified(raw_text, item_id, VERIFY_SUCCESS)
            }
            Ok(response) => {
                let message = response
                    .error
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(localize_server_error)
                    .unwrap_or_else(|| VERIFY_FAILED.to_string());
                info!(item_id = %item_id, reason = %message, "Item rejected");
                ScanResult::rejected(raw_text, Some(item_id), message)
            }
            Err(err) => {
                warn!(item_id = %item_id, error = %err, "Verification failed");
                ScanResult::rejected(raw_text, Some(item_id), verification_error_message(&err))
            }
        }
    }
}

fn verification_error_message(err: &ServiceError) -> String {
    match err {
        ServiceError::ServerError {
            message: Some(message),
            ..
        } => message.clone(),
        ServiceError::ServerError {
            status,
            message: None,
        } => format!("{} ({})", VERIFY_FAILED, status),
        ServiceError::NotFound(message) | ServiceError::Unauthorized(message) => message.clone(),
        _ => VERIFY_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorResponse;
    use crate::models::ScanVerifyResponse;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedReader {
        codes: VecDeque<Result<String, ServiceError>>,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        active: bool,
    }

    impl ScriptedReader {
        fn with_codes(codes: &[&str]) -> Self {
            Self {
                codes: codes.iter().map(|c| Ok(c.to_string())).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl CodeReader for ScriptedReader {
        async fn start(&mut self) -> Result<(), ServiceError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.active = true;
            Ok(())
        }

        async fn next_code(&mut self) -> Result<Option<String>, ServiceError> {
            assert!(self.active, "reader used while stopped");
            self.codes.pop_front().transpose()
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.active = false;
        }
    }

    enum Verdict {
        Verified,
        Rejected(Option<&'static str>),
        Status(u16, Option<&'static str>),
        Offline,
    }

    struct FakeVerifier {
        verdict: Verdict,
        seen: Mutex<Vec<ScanVerifyRequest>>,
    }

    impl FakeVerifier {
        fn new(verdict: Verdict) -> Arc<Self> {
            Arc::new(Self {
                verdict,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl VerificationGateway for FakeVerifier {
        async fn verify_scan(
            &self,
            request: &ScanVerifyRequest,
        ) -> Result<ScanVerifyResponse, ServiceError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.verdict {
                Verdict::Verified => Ok(ScanVerifyResponse {
                    is_verified: true,
                    error: None,
                }),
                Verdict::Rejected(reason) => Ok(ScanVerifyResponse {
                    is_verified: false,
                    error: reason.map(str::to_string),
                }),
                Verdict::Status(status, reason) => {
                    let body = reason.map(|r| ErrorResponse {
                        error: Some(r.to_string()),
                        ..Default::default()
                    });
                    Err(ServiceError::from_response(*status, body.as_ref()))
                }
                Verdict::Offline => Err(ServiceError::NetworkError("connection refused".into())),
            }
        }
    }

    #[tokio::test]
    async fn verified_scan_releases_reader_first() {
        let reader = ScriptedReader::with_codes(&["TSK0003-ITM00042"]);
        let stops = reader.stops.clone();
        let verifier = FakeVerifier::new(Verdict::Verified);
        let mut session = ScanSession::new("TSK0003", reader, verifier.clone());

        let result = session.scan_once().await.unwrap().unwrap();
        assert!(result.success);
        assert_eq!(result.item_id.as_deref(), Some("ITM00042"));
        assert_eq!(result.message, VERIFY_SUCCESS);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(verifier.seen.lock().unwrap()[0].task_id, "TSK0003");
    }

    #[tokio::test]
    async fn unrecognized_code_skips_the_server() {
        let verifier = FakeVerifier::new(Verdict::Verified);
        let session = ScanSession::new("TSK0003", ScriptedReader::default(), verifier.clone());

        let result = session.verify_code("hello world").await;
        assert!(!result.success);
        assert_eq!(result.message, UNRECOGNIZED_CODE);
        assert!(verifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn business_rejections_are_localized() {
        let verifier = FakeVerifier::new(Verdict::Rejected(Some("Item has not been printed yet")));
        let session = ScanSession::new("TSK0003", ScriptedReader::default(), verifier);
        assert_eq!(session.verify_code("ITM7").await.message, "該物品尚未打印");

        let verifier = FakeVerifier::new(Verdict::Rejected(None));
        let session = ScanSession::new("TSK0003", ScriptedReader::default(), verifier);
        assert_eq!(session.verify_code("ITM7").await.message, VERIFY_FAILED);
    }

    #[tokio::test]
    async fn http_and_transport_failures_map_to_messages() {
        let verifier = FakeVerifier::new(Verdict::Status(400, Some("Item is not assigned to this task")));
        let session = ScanSession::new("T", ScriptedReader::default(), verifier);
        assert_eq!(session.verify_code("7").await.message, "該物品不屬於此任務");

        let verifier = FakeVerifier::new(Verdict::Status(500, None));
        let session = ScanSession::new("T", ScriptedReader::default(), verifier);
        assert_eq!(session.verify_code("7").await.message, "驗證失敗 (500)");

        let verifier = FakeVerifier::new(Verdict::Offline);
        let session = ScanSession::new("T", ScriptedReader::default(), verifier);
        assert_eq!(session.verify_code("7").await.message, VERIFY_ERROR);
    }

    #[tokio::test]
    async fn reader_error_still_releases_reader() {
        let mut reader = ScriptedReader::default();
        reader
            .codes
            .push_back(Err(ServiceError::InvalidOperation("camera unplugged".into())));
        let stops = reader.stops.clone();
        let mut session = ScanSession::new("T", reader, FakeVerifier::new(Verdict::Verified));

        assert!(session.scan_once().await.is_err());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(!session.reader().active);
    }

    #[tokio::test]
    async fn retry_rearms_the_session() {
        let reader = ScriptedReader::with_codes(&["ITM1", "ITM2"]);
        let starts = reader.starts.clone();
        let mut session = ScanSession::new("T", reader, FakeVerifier::new(Verdict::Verified));

        session.scan_once().await.unwrap();
        assert!(session.scan_once().await.is_err());

        session.retry();
        assert!(session.last_result().is_none());
        let second = session.scan_once().await.unwrap().unwrap();
        assert_eq!(second.item_id.as_deref(), Some("ITM2"));
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_reader_ends_the_session() {
        let mut session = ScanSession::new(
            "T",
            ScriptedReader::default(),
            FakeVerifier::new(Verdict::Verified),
        );
        assert_eq!(session.scan_once().await.unwrap(), None);
    }

    #[tokio::test]
    async fn line_reader_skips_blank_lines() {
        let input: &[u8] = b"\n  \nTSK1-ITM9\n";
        let mut reader = LineCodeReader::new(BufReader::new(input));
        {
            let mut guard = ReaderGuard::acquire(&mut reader).await.unwrap();
            assert_eq!(guard.next_code().await.unwrap().as_deref(), Some("TSK1-ITM9"));
            assert_eq!(guard.next_code().await.unwrap(), None);
        }
        assert!(!reader.is_active());
        assert!(reader.next_code().await.is_err());
    }
}
