//! monit 진입점.
//!
//! 현재 프로세스의 상태를 설정된 수신처로 주기 보고한다.
//! SIGINT/SIGTERM을 받으면 루프를 멈추고 종료한다.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use monit::{
    build_client, FlushOutcome, HttpReportSink, HttpSinkConfig, Monitor, MonitorOptions,
    ReportConfig, SysInfoHealthProvider,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 경량 메트릭 리포터
///
/// 값을 지정하지 않으면 MONIT_HOST, MONIT_INTERVAL 환경 변수를 사용한다.
#[derive(Parser, Debug)]
#[command(name = "monit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 리포트 수신처 URL
    #[arg(long)]
    host: Option<String>,

    /// 리포트 주기 (초)
    #[arg(long, short = 'i')]
    interval: Option<u64>,

    /// 모든 리포트에 포함할 기본 필드 (key=value, 반복 가능, 값은 JSON 또는 문자열)
    #[arg(long = "base", short = 'b', value_parser = parse_base_field)]
    base: Vec<(String, Value)>,

    /// JSON 설정 파일 (CLI 인자가 우선)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// TLS 인증서 검증 생략
    #[arg(long)]
    insecure: bool,

    /// 요청 타임아웃 (초)
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// 한 번만 보고하고 종료
    #[arg(long)]
    once: bool,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

/// `key=value` 파싱. 값이 JSON이 아니면 문자열로 취급한다.
fn parse_base_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("key=value 형식이 아님: {raw}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("빈 키: {raw}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// 설정 파일 → CLI 인자 순으로 입력 설정 구성
fn load_options(args: &Args) -> Result<MonitorOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("설정 파일 읽기 실패: {}", path.display()))?;
            serde_json::from_str::<MonitorOptions>(&raw)
                .with_context(|| format!("설정 파일 파싱 실패: {}", path.display()))?
        }
        None => MonitorOptions::default(),
    };

    if let Some(host) = &args.host {
        options.host = Some(host.clone());
    }
    if let Some(interval) = args.interval {
        options.interval_secs = Some(interval);
    }
    for (key, value) in &args.base {
        options.base.insert(key.clone(), value.clone());
    }
    Ok(options)
}

/// OS 시그널 대기 (SIGINT, SIGTERM)
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).context("SIGINT 핸들러 등록 실패")?;
        let mut sigterm = signal(SignalKind::terminate()).context("SIGTERM 핸들러 등록 실패")?;

        tokio::select! {
            _ = sigint.recv() => info!("SIGINT 수신"),
            _ = sigterm.recv() => info!("SIGTERM 수신"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Ctrl+C 핸들러 등록 실패")?;
        info!("Ctrl+C 수신");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "monit={0},monit_core={0},monit_monitor={0},monit_network={0}",
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let options = load_options(&args)?;
    let config = ReportConfig::resolve(options).map_err(|e| anyhow!("설정 해석 실패: {e}"))?;

    if args.insecure {
        warn!("TLS 인증서 검증 비활성화");
    }
    let client = build_client(&HttpSinkConfig {
        timeout: Duration::from_secs(args.timeout_secs),
        accept_invalid_certs: args.insecure,
    })?;
    let sink = Arc::new(HttpReportSink::new(client, config.endpoint().clone()));
    let health = Arc::new(SysInfoHealthProvider::new()?);
    let monitor = Monitor::new(config, sink, health);

    if args.once {
        let outcome = monitor.flush_now().await;
        info!("단일 보고 결과: {outcome:?}");
        if outcome != FlushOutcome::Delivered {
            bail!("리포트 전송 실패: {outcome:?}");
        }
        return Ok(());
    }

    monitor.start()?;
    wait_for_signal().await?;
    monitor.shutdown().await;

    info!("monit 종료");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_field_json_value() {
        assert_eq!(
            parse_base_field("shard=3").unwrap(),
            ("shard".to_string(), json!(3))
        );
        assert_eq!(
            parse_base_field("tags=[\"a\",\"b\"]").unwrap(),
            ("tags".to_string(), json!(["a", "b"]))
        );
    }

    #[test]
    fn base_field_falls_back_to_string() {
        assert_eq!(
            parse_base_field("auth=maybe=INeedThis").unwrap(),
            ("auth".to_string(), json!("maybe=INeedThis"))
        );
    }

    #[test]
    fn base_field_requires_key() {
        assert!(parse_base_field("novalue").is_err());
        assert!(parse_base_field("=1").is_err());
    }

    #[test]
    fn cli_overrides_options() {
        let args = Args::parse_from([
            "monit",
            "--host",
            "http://localhost:9000/r",
            "-i",
            "5",
            "-b",
            "app=api",
            "-b",
            "shard=2",
        ]);
        let options = load_options(&args).unwrap();

        assert_eq!(options.host.as_deref(), Some("http://localhost:9000/r"));
        assert_eq!(options.interval_secs, Some(5));
        assert_eq!(options.base["app"], json!("api"));
        assert_eq!(options.base["shard"], json!(2));
        assert!(!args.once);
    }

    #[test]
    fn missing_config_file_is_error() {
        let args = Args::parse_from(["monit", "--config", "/nonexistent/monit.json"]);
        assert!(load_options(&args).is_err());
    }
}
