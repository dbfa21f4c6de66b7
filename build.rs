fn main() {
    cynic_codegen::register_schema("rickandmorty")
        .from_sdl_file("schemas/rickandmorty.graphql")
        .expect("failed to load rickandmorty.graphql schema file")
        .as_default()
        .expect("failed to register rickandmorty schema as default");
}
