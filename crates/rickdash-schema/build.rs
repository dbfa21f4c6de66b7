fn main() {
    cynic_codegen::register_schema("rickandmorty")
        .from_sdl_file("../../schemas/rickandmorty.graphql")
        .expect("Failed to find Rick and Morty GraphQL Schema")
        .as_default()
        .expect("Failed to set Rick and Morty schema as default");
}
