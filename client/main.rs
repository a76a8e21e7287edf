// dis-probe: exercise the DIS TCP transport against a live peer
use clap::{Parser, Subcommand};
use crossbeam::channel::bounded;
use dis_ng::{dis, dis_tcp_funcs};
use dis_probe::{ping, spawn_workers};
use std::error::Error;
use std::net::{TcpListener, TcpStream};
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dis-probe")]
#[command(about = "Echo server and ping client over the DIS TCP transport", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Readiness-wait timeout in seconds (overrides DIS_TCP_TIMEOUT)
    #[arg(short, long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept connections and echo whatever they send
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:15001")]
        bind: String,

        /// Number of echo worker threads
        #[arg(short, long, default_value_t = 4)]
        workers: usize,
    },

    /// Send a message to an echo server and time the round trip
    Ping {
        #[arg(short, long, default_value = "127.0.0.1:15001")]
        addr: String,

        /// Number of round trips
        #[arg(short = 'n', long, default_value_t = 5)]
        count: u32,

        #[arg(default_value = "HELLO")]
        message: String,
    },
}

fn serve(bind: &str, workers: usize) -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind(bind)?;
    info!(%bind, workers, "dis-probe echo server listening");

    let (tx, rx) = bounded(workers.max(1) * 4);
    let handles = spawn_workers(dis(), workers.max(1), rx);

    for stream in listener.incoming() {
        match stream {
            Ok(s) => {
                if tx.send(s).is_err() {
                    break;
                }
            }
            Err(e) => warn!(error = %e, "accept failed"),
        }
    }

    drop(tx);
    for h in handles {
        let _ = h.join();
    }
    Ok(())
}

fn ping_loop(addr: &str, count: u32, message: &str) -> Result<(), Box<dyn Error>> {
    let stream = TcpStream::connect(addr)?;
    let payload = message.as_bytes();

    for seq in 0..count {
        let pong = ping(dis(), &stream, payload)?;
        if pong.echoed != payload {
            return Err(format!("echo mismatch on round trip {}", seq).into());
        }
        println!("{} bytes from {}: seq={} time={:.3} ms",
            payload.len(), addr, seq, pong.rtt.as_secs_f64() * 1000.0);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    dis_tcp_funcs();
    if let Some(secs) = cli.timeout {
        dis().control().timeout.set_secs(secs);
    }

    let result = match cli.command {
        Commands::Serve { bind, workers } => serve(&bind, workers),
        Commands::Ping { addr, count, message } => ping_loop(&addr, count, &message),
    };

    if let Err(e) = result {
        error!(error = %e, "dis-probe failed");
        process::exit(1);
    }
}
