use dotenvy::dotenv_iter;

/// Bake the variables of a local `.env` into the binary so they can serve as
/// compile-time defaults
fn main() {
    println!("cargo:rerun-if-changed=.env");

    let Ok(entries) = dotenv_iter() else {
        return;
    };

    for (key, value) in entries.flatten() {
        if key.starts_with("SITECHECK_") {
            println!("cargo:rustc-env={key}={value}");
        }
    }
}
