use serde::{Deserialize, Serialize};

/// Column order of a JMeter-style result file.
pub const JTL_HEADER: [&str; 17] = [
    "timeStamp",
    "elapsed",
    "label",
    "responseCode",
    "responseMessage",
    "threadName",
    "dataType",
    "success",
    "failureMessage",
    "bytes",
    "sentBytes",
    "grpThreads",
    "allThreads",
    "URL",
    "Latency",
    "IdleTime",
    "Connect",
];

pub const RESPONSE_CODE_OK: u16 = 200;
pub const RESPONSE_MESSAGE_OK: &str = "OK";
pub const GRP_THREADS: u64 = 1;
pub const LATENCY_MS: u64 = 0;
pub const IDLE_TIME_MS: u64 = 2;
pub const CONNECT_MS: u64 = 794;

/// One sampled request. Field order matches [`JTL_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JtlRecord {
    /// Epoch milliseconds at which the request completed
    pub time_stamp: i64,
    pub elapsed: u64,
    pub label: String,
    pub response_code: u16,
    pub response_message: String,
    pub thread_name: String,
    pub data_type: String,
    pub success: bool,
    pub failure_message: String,
    pub bytes: u64,
    pub sent_bytes: u64,
    pub grp_threads: u64,
    pub all_threads: u64,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Latency")]
    pub latency: u64,
    #[serde(rename = "IdleTime")]
    pub idle_time: u64,
    #[serde(rename = "Connect")]
    pub connect: u64,
}

impl JtlRecord {
    /// A successful sample with the fixed sentinel columns filled in.
    pub fn success(
        time_stamp: i64,
        elapsed: u64,
        label: impl Into<String>,
        thread_name: impl Into<String>,
        bytes: u64,
        sent_bytes: u64,
        all_threads: u64,
    ) -> Self {
        Self {
            time_stamp,
            elapsed,
            label: label.into(),
            response_code: RESPONSE_CODE_OK,
            response_message: RESPONSE_MESSAGE_OK.to_string(),
            thread_name: thread_name.into(),
            data_type: String::new(),
            success: true,
            failure_message: String::new(),
            bytes,
            sent_bytes,
            grp_threads: GRP_THREADS,
            all_threads,
            url: String::new(),
            latency: LATENCY_MS,
            idle_time: IDLE_TIME_MS,
            connect: CONNECT_MS,
        }
    }
}
