use std::sync::Arc;

use wrapp_modules::{
    errors::ArgumentError, Arguments, Class, ClassMetadata, DependencyGraph, Module,
    ModuleDeclaration, ModuleMetadata, Provider, Resolver,
};

fn main() {
    let resolver = futures::executor::block_on(async {
        let graph = DependencyGraph::compile(ModuleDeclaration::of::<AppModule>()).await;
        let resolver = Resolver::new(graph);
        resolver.init().await.map(|_| resolver)
    });
    let resolver = match resolver {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    println!("{:?}", resolver);
    match futures::executor::block_on(resolver.resolve::<Greeter>()) {
        Ok(greeter) => println!("{}", greeter.greet()),
        Err(e) => eprintln!("{e}"),
    }
}

struct AppModule;
impl Module for AppModule {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .import::<NameModule>()
            .provider(Provider::class::<Greeter>())
    }
}

struct NameModule;
impl Module for NameModule {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .provider(Provider::use_value("name", "test".to_string()))
            .export("name")
    }
}

struct Greeter {
    name: Arc<String>,
}
impl Greeter {
    fn greet(&self) -> String {
        format!("Hello, {}!", self.name)
    }
}
impl Class for Greeter {
    fn metadata() -> ClassMetadata {
        ClassMetadata::new().inject_token("name")
    }

    async fn construct(args: Arguments) -> Result<Self, ArgumentError> {
        Ok(Greeter { name: args.get(0)? })
    }
}
