//! User-space exerciser for the stub character device: open read-write,
//! write a literal, read into a 10-byte buffer expecting EOF, close.

use std::process::exit;

use chardev::ChardevModule;
use kernel::{module, Kernel, OpenFlags};

const DEVICE_FILE: &str = "/dev/mychardev";

fn main() {
    let kernel = Kernel::new();
    let _module = match module::load::<ChardevModule>(&kernel) {
        Ok(module) => module,
        Err(err) => {
            eprintln!("module load failed: {:?}", err);
            exit(1);
        }
    };

    println!("Opening File:{}", DEVICE_FILE);
    let mut file = match kernel.open(DEVICE_FILE, OpenFlags::O_RDWR) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Open Failed: {:?}", err);
            exit(1);
        }
    };

    let retval = match file.write(b"hello") {
        Ok(written) => written as isize,
        Err(err) => err.to_errno() as isize,
    };
    println!("Write retval:{}", retval);

    let mut buffer = [0u8; 10];
    let retval = match file.read(&mut buffer) {
        Ok(read) => read as isize,
        Err(err) => err.to_errno() as isize,
    };
    println!("Read retval:{}", retval);

    println!("Closing File");
    drop(file);
}
