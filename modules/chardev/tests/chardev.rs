use chardev::ChardevModule;
use kernel::{code::ENOENT, module, Kernel, OpenFlags};

#[test]
fn load_exposes_the_node_and_unload_removes_it() {
    let kernel = Kernel::new();
    let module = module::load::<ChardevModule>(&kernel).unwrap();
    assert!(kernel.node_exists("/dev/mychardev"));
    assert!(kernel.class_exists("myclass"));
    assert_eq!(kernel.region_count(), 1);

    drop(module);
    assert!(!kernel.node_exists("/dev/mychardev"));
    assert!(!kernel.class_exists("myclass"));
    assert_eq!(kernel.region_count(), 0);
    assert_eq!(kernel.cdev_count(), 0);
}

#[test]
fn read_reports_eof_and_write_consumes_everything() {
    let kernel = Kernel::new();
    let _module = module::load::<ChardevModule>(&kernel).unwrap();

    let mut file = kernel.open("/dev/mychardev", OpenFlags::O_RDWR).unwrap();
    assert_eq!(file.write(b"hello").unwrap(), 5);

    let mut buffer = [0u8; 10];
    assert_eq!(file.read(&mut buffer).unwrap(), 0);
    assert_eq!(buffer, [0u8; 10], "EOF read must not touch the buffer");
}

#[test]
fn write_never_alters_subsequent_reads() {
    let kernel = Kernel::new();
    let _module = module::load::<ChardevModule>(&kernel).unwrap();

    let mut file = kernel.open("/dev/mychardev", OpenFlags::O_RDWR).unwrap();
    let mut buffer = [0u8; 10];
    assert_eq!(file.read(&mut buffer).unwrap(), 0);
    assert_eq!(file.write(b"some data").unwrap(), 9);
    assert_eq!(file.read(&mut buffer).unwrap(), 0);
}

#[test]
fn each_open_is_an_independent_session() {
    let kernel = Kernel::new();
    let _module = module::load::<ChardevModule>(&kernel).unwrap();

    let mut first = kernel.open("/dev/mychardev", OpenFlags::O_RDWR).unwrap();
    let mut second = kernel.open("/dev/mychardev", OpenFlags::O_RDWR).unwrap();
    assert_eq!(first.write(b"abc").unwrap(), 3);
    let mut buffer = [0u8; 4];
    assert_eq!(second.read(&mut buffer).unwrap(), 0);
}

#[test]
fn open_after_unload_is_enoent() {
    let kernel = Kernel::new();
    let module = module::load::<ChardevModule>(&kernel).unwrap();
    drop(module);
    let err = kernel
        .open("/dev/mychardev", OpenFlags::O_RDWR)
        .unwrap_err();
    assert_eq!(err, ENOENT);
}
