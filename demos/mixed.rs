use capability_table::{
    CapabilityError, CapabilityStore, DispatchRegistry, NumberValue, StringValue,
};

fn main() -> Result<(), CapabilityError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let registry = DispatchRegistry::new()
        .with::<StringValue>()
        .with::<NumberValue>();
    let mut store = CapabilityStore::with_dispatch(registry);

    let greeting = store.push(StringValue::create("Hello")?)?;
    store.push(NumberValue::new(2024))?;
    store.push(StringValue::create("%s is printed verbatim")?)?;

    for (handle, text) in store.live() {
        println!("{}: {}", handle, text);
    }

    store.try_destroy(greeting)?;
    if let Err(err) = store.try_to_c_string(greeting) {
        println!("{}", err);
    }
    Ok(())
}
