//! Prints owner counts and emptiness before and after each kind of handle operation.
//!
//! Run with `RUST_LOG=shared_ptr=trace` to see allocations and releases as they happen.

use std::fmt::Display;

use shared_ptr::SharedPtr;

fn print_info<T: Display>(text: &str, sm: &SharedPtr<T>) {
    println!("{}", text);
    println!("\tReference counter: {}", sm.use_count());
    println!("\tIs empty: {}", sm.is_empty());
    match sm.try_deref() {
        Ok(value) => println!("\tSmart pointer value: {}", value),
        Err(err) => println!("{}", err),
    }
}

fn construction() {
    let sm: SharedPtr<i32> = SharedPtr::default();
    print_info("Default handle", &sm);

    let sm: SharedPtr<i32> = SharedPtr::null();
    print_info("Null handle", &sm);

    let sm: SharedPtr<i32> = SharedPtr::from_box(Box::new(10));
    print_info("Handle owning a boxed value", &sm);
}

fn copy_and_move() {
    let mut sm: SharedPtr<i32> = SharedPtr::new(5);
    print_info("Before moving", &sm);
    let sm1 = sm.take();
    print_info("Source after moving", &sm);
    print_info("Target after moving", &sm1);

    let sm: SharedPtr<i32> = SharedPtr::new(42);
    let sm1 = sm.clone();
    print_info("Source after copying", &sm);
    print_info("Copy", &sm1);
}

fn assignment() -> shared_ptr::Result<()> {
    let mut sm: SharedPtr<i32> = SharedPtr::new(42);
    let sm1 = sm.clone();
    let sm2 = sm1.clone();
    let sm3 = sm1.clone();
    let mut sm4: SharedPtr<i32> = SharedPtr::new(10);
    print_info("Group before move assignment", &sm);
    print_info("Single handle before move assignment", &sm4);

    sm.assign_from(&mut sm4)?;
    print_info("Target after move assignment", &sm);
    print_info("Former group member", &sm1);
    print_info("Source after move assignment", &sm4);

    sm4.assign(&sm2)?;
    print_info("Empty handle after copy assignment", &sm4);
    print_info("Group member", &sm3);
    Ok(())
}

fn swapping() {
    let mut sm: SharedPtr<i32> = SharedPtr::new(42);
    let mut sm1: SharedPtr<i32> = SharedPtr::null();
    sm.swap(&mut sm1);
    print_info("After swapping with an empty handle", &sm);
    print_info("Empty handle after swapping", &sm1);
}

fn main() {
    env_logger::init();

    construction();
    copy_and_move();
    if let Err(err) = assignment() {
        eprintln!("assignment failed: {}", err);
    }
    swapping();
}
