use tracing::{error, info};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();

    let server_task = tokio::spawn(async {
        if let Err(e) = server::run().await {
            error!(error = %e, "server::run returned error");
            return Err(e);
        }
        Ok(())
    });

    tokio::select! {
        res = server_task => match res {
            Ok(Ok(())) => std::process::ExitCode::SUCCESS,
            Ok(Err(_)) => std::process::ExitCode::FAILURE,
            Err(e) => {
                error!(error = %e, "server task join error");
                std::process::ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, shutting down");
            std::process::ExitCode::SUCCESS
        }
    }
}
