//! Object listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use kumiko_core::{ObjectCategory, Patcher};

#[derive(Args)]
pub struct ObjectsArgs {
    /// Show inlets, outlets and attributes of one object, e.g. "osc~ 440"
    #[arg(value_name = "OBJECT")]
    object: Option<String>,
}

const CATEGORIES: [ObjectCategory; 4] = [
    ObjectCategory::Control,
    ObjectCategory::Signal,
    ObjectCategory::Timing,
    ObjectCategory::Communication,
];

pub fn run(args: &ObjectsArgs) -> anyhow::Result<()> {
    let factory = kumiko_registry::factory();

    let Some(text) = &args.object else {
        println!("Available Objects");
        println!("=================");
        for category in CATEGORIES {
            let mut descriptors = factory.descriptors_in_category(category);
            if descriptors.is_empty() {
                continue;
            }
            descriptors.sort_by(|a, b| a.name.cmp(&b.name));
            println!();
            println!("{}:", category.name());
            for descriptor in descriptors {
                println!("  {:10}  {}", descriptor.name, descriptor.description);
            }
        }
        println!();
        println!("Details: kumiko objects \"osc~ 440\"");
        return Ok(());
    };

    let name = text.split_whitespace().next().unwrap_or_default();
    let descriptor = factory
        .descriptor(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown object: {}", name))?;

    println!("{}", descriptor.name);
    println!("{}", "=".repeat(descriptor.name.as_str().chars().count()));
    println!();
    println!("{}", descriptor.description);
    println!("Category: {}", descriptor.category.name());
    println!();

    let patcher = Patcher::new(factory);
    let id = match patcher.create_from_text(text) {
        Ok(id) => id,
        Err(error) => {
            println!("Cannot instantiate '{text}': {error}");
            return Ok(());
        }
    };
    let Some(info) = patcher.box_info(id) else {
        return Ok(());
    };

    println!("Inlets:");
    for (i, inlet) in info.inlets.iter().enumerate() {
        let hot = if inlet.is_hot() { "hot" } else { "cold" };
        println!(
            "  {i}  {:8}  {:4}  {}",
            inlet.kind().name(),
            hot,
            inlet.description()
        );
    }
    println!("Outlets:");
    for (i, outlet) in info.outlets.iter().enumerate() {
        println!("  {i}  {:8}  {}", outlet.kind().name(), outlet.description());
    }

    if let Some(attributes) = patcher.attributes(id) {
        println!();
        println!("Attributes:");
        println!("  {:14}  {}", "Name", "Value");
        println!("  {:14}  {}", "----", "-----");
        for name in attributes.attribute_names() {
            let value = kumiko_core::atoms_to_text(&attributes.attribute_value(name));
            println!("  {:14}  {}", name, value);
        }
    }
    Ok(())
}
