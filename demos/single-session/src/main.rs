use std::io::BufRead;
use std::process::ExitCode;

use gcforge::prelude::*;

// ---------------------------------------------------------------------------
// Step-up prompt
// ---------------------------------------------------------------------------

/// Asks on the terminal and reads the code from stdin.
struct StdinPrompt;

impl StepUpPrompt for StdinPrompt {
    fn request_code(&self, request: StepUpRequest, responder: StepUpHandle) {
        match &request.email_domain {
            Some(domain) => eprintln!(
                "{}: enter the {} sent to your address at {domain}:",
                request.username, request.kind
            ),
            None => eprintln!("{}: enter your {}:", request.username, request.kind),
        }

        read_line_detached(std::io::BufReader::new(std::io::stdin()), move |line| {
            if let Err(err) = responder.supply(request.kind, &line) {
                eprintln!("code not accepted: {err}");
            }
        });
    }
}

/// Reads one line on a plain thread and hands it to `deliver`.
///
/// Not `spawn_blocking`: the runtime waits for blocking tasks when it shuts
/// down, and the session can end while nobody has typed a code.
fn read_line_detached<I, F>(mut input: I, deliver: F)
where
    I: BufRead + Send + 'static,
    F: FnOnce(String) + Send + 'static,
{
    std::thread::spawn(move || {
        let mut line = String::new();
        if input.read_line(&mut line).is_ok() {
            deliver(line);
        }
    });
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "gcforge.json".to_string());

    match run(&path).await {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(outcome) => {
            eprintln!("session ended: {outcome}");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

async fn run(path: &str) -> Result<Outcome, GcforgeError> {
    let config = GcforgeConfig::from_file(path)?;
    eprintln!(
        "running {:?} for {} via {}",
        config.workflow, config.account.username, config.bridge_url
    );

    let (session, handle) = SessionBuilder::from_config(config)
        .prompt(StdinPrompt)
        .connect()
        .await?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, stopping session");
            handle.stop();
        }
    });

    let outcome = session.run().await;
    println!("{outcome}");
    Ok(outcome)
}
