use std::sync::Arc;

use confweave::{
    Config, Element, ElementPath, Key, Module, ModuleProvider, Supplier, TypeRegistry, TypeSpec,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct StoreData {
    capacity: usize,
}

struct Store {
    capacity: usize,
    region: Arc<String>,
}

impl Element for Store {
    fn spec() -> TypeSpec {
        TypeSpec::builder(key("demo:store"))
            .data::<StoreData>()
            .named_dependency(key("demo:setting"), key("demo:region"))
            .cached(true)
            .build(|args| {
                Ok(Store {
                    capacity: args.data::<StoreData>()?.capacity,
                    region: args.get::<String>(1)?,
                })
            })
    }
}

#[derive(Deserialize)]
struct HandlerData {
    route: String,
    store: ElementPath,
}

struct Handler {
    route: String,
    store: Arc<Store>,
}

impl Element for Handler {
    fn spec() -> TypeSpec {
        TypeSpec::builder(key("demo:handler"))
            .data::<HandlerData>()
            .build(|args| {
                let data = args.data::<HandlerData>()?;
                Ok(Handler {
                    route: data.route.clone(),
                    store: args.child(&data.store)?,
                })
            })
    }
}

struct Settings {
    region: String,
}

impl Module for Settings {
    fn suppliers(self: Arc<Self>) -> Vec<Supplier> {
        vec![
            Supplier::new(key("demo:setting"), move |_| Ok(self.region.clone()))
                .named(key("demo:region")),
        ]
    }
}

fn key(text: &str) -> Key {
    Key::parse(text).expect("static key")
}

fn main() -> Result<(), confweave::Error> {
    let registry = Arc::new(TypeRegistry::new());
    registry.register::<Store>()?;
    registry.register::<Handler>()?;

    let context = Config::builder()
        .with_file("demos/wiring.toml", true)
        .with_env("WIRING", "__")
        .into_context(&registry)?;

    let settings = ModuleProvider::from_module(Arc::new(Settings {
        region: "eu-west".into(),
    }))?;

    let handlers = context.provide_each::<Handler>("/handlers", &settings, false)?;
    for (path, handler) in &handlers {
        println!(
            "{path}: {} -> store({}, {})",
            handler.route, handler.store.capacity, handler.store.region
        );
    }

    let shared = handlers
        .windows(2)
        .all(|pair| Arc::ptr_eq(&pair[0].1.store, &pair[1].1.store));
    println!("store shared across handlers: {shared}");

    Ok(())
}
