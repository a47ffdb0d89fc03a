use handcode::prelude::*;
use handcode::services::{detect_language, JudgeClient};

// run_code <source file> [language]
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| NNError::Other("usage: run_code <source file> [language]".to_string()))?;
    let code = std::fs::read_to_string(&path)?;

    let language = match args.next() {
        Some(language) => language,
        None => {
            let detected = detect_language(&code);
            log::info!("detected language: {}", detected);
            detected.to_string()
        }
    };

    let client = JudgeClient::new(JudgeConfig::from_env())?;
    match client.execute(&code, &language).await {
        Ok(report) => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| NNError::Other(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }
        Err(err) => {
            log::error!("execution failed ({}): {}", err.status_code(), err);
            Err(err)
        }
    }
}
