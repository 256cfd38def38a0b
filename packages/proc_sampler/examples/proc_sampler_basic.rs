//! Samples the current process while it allocates and touches memory, then prints a summary.

#![allow(missing_docs, reason = "No need for API documentation in example code")]

use std::time::Duration;

use proc_sampler::{SampleOptions, Sampler, format_bytes};

fn main() {
    let running = Sampler::current_process()
        .start(SampleOptions::default().with_interval(Duration::from_millis(50)));

    let mut buffers = Vec::new();
    for round in 0..20_u8 {
        buffers.push(vec![round; 8 * 1024 * 1024]);
        std::thread::sleep(Duration::from_millis(25));
    }

    let series = running.stop();

    println!("readings : {}", series.cpu().len());
    println!("CPU mean : {:.2}%", series.cpu_mean().unwrap_or_default());
    println!("CPU max  : {:.2}%", series.cpu_max().unwrap_or_default());
    println!(
        "RSS max  : {}",
        format_bytes(series.rss_max().unwrap_or_default())
    );

    for (interface, growth) in series.network_growth() {
        println!(
            "{interface}: {} in, {} out",
            format_bytes(growth.bytes_received),
            format_bytes(growth.bytes_sent)
        );
    }

    drop(buffers);
}
