use capability_table::{to_c_string, StringValue};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let value = StringValue::create("Hello").expect("unable to allocate text");
    print!("{}", to_c_string(&value));
    value.destroy();
}
