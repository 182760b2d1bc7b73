//! Tick-counter client: two delayed 8-byte reads of `/dev/jiffies` and
//! their difference.
//!
//! Exit codes: 2 on open failure, 3 on a short first read, 4 on a short
//! second read.

use std::{process::exit, thread::sleep, time::Duration};

use jiffies::JiffiesModule;
use kernel::{module, Kernel, OpenFlags};

fn main() {
    let kernel = Kernel::new();
    let _module = match module::load::<JiffiesModule>(&kernel) {
        Ok(module) => module,
        Err(err) => {
            eprintln!("module load failed: {:?}", err);
            exit(2);
        }
    };

    let mut fd = match kernel.open("/dev/jiffies", OpenFlags::O_RDWR) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("fd failed: {:?}", err);
            exit(2);
        }
    };

    let mut buf = [0u8; 8];
    let old_jiffies = match fd.read(&mut buf) {
        Ok(8) => u64::from_ne_bytes(buf),
        _ => {
            println!("Failed in reading first jiffies");
            exit(3);
        }
    };
    println!("First Read:{}", old_jiffies);

    sleep(Duration::from_secs(1));

    let new_jiffies = match fd.read(&mut buf) {
        Ok(8) => u64::from_ne_bytes(buf),
        _ => {
            println!("Failed in reading second jiffies");
            exit(4);
        }
    };
    println!("Second Read:{}", new_jiffies);

    println!("Difference:{}", new_jiffies - old_jiffies);
}
