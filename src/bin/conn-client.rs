use clap::Parser;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "conn-client")]
#[command(about = "Send messages to a conn-server and print the responses", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:9000")]
    addr: String,

    /// Seconds to wait for each response.
    #[arg(short, long, default_value_t = 5)]
    timeout: u64,

    /// Size of the receive buffer.
    #[arg(long, default_value_t = 10_000)]
    buffer_size: usize,

    /// Messages to send, one request/response cycle each.
    #[arg(required = true)]
    messages: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut stream = TcpStream::connect(&cli.addr).await?;
    let mut buffer = vec![0u8; cli.buffer_size];

    for message in &cli.messages {
        stream.write_all(message.as_bytes()).await?;

        let read = tokio::time::timeout(Duration::from_secs(cli.timeout), stream.read(&mut buffer)).await;
        match read {
            Ok(Ok(0)) => {
                eprintln!("Error: server closed the connection");
                std::process::exit(1);
            }
            Ok(Ok(n)) => println!("{}", String::from_utf8_lossy(&buffer[..n])),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                eprintln!("Error: no response within {}s", cli.timeout);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
