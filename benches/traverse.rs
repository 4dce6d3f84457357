use iai_callgrind::{black_box, main};

use conjoin::{Chain, Product};

#[inline(never)]
fn iterate_product() {
    let p = Product::new((0u32..16, 0u32..16, (0u32..16).collect::<Vec<_>>()));
    black_box(p.iter().fold(0u32, |acc, (a, b, c)| acc ^ a ^ b ^ c));
}

#[inline(never)]
fn iterate_product_backwards() {
    let p = Product::new((0u32..16, 0u32..16, (0u32..16).collect::<Vec<_>>()));
    black_box(p.iter().rev().fold(0u32, |acc, (a, b, c)| acc ^ a ^ b ^ c));
}

#[inline(never)]
fn linearize_product() {
    let p = Product::new((0u32..16, 0u32..16, 0u32..16));
    for linear in 0..p.len() {
        let index = p.index_at_linear(linear);
        black_box(p.linear_position(&index));
    }
}

#[inline(never)]
fn iterate_chain() {
    let c = Chain::new((0u32..1024, Vec::new(), (1024u32..2048).collect::<Vec<_>>()));
    black_box(c.iter().fold(0u32, |acc, x| acc ^ x));
}

main!(
    callgrind_args = "--simulate-wb=no", "--simulate-hwpref=yes",
        "--I1=32768,8,64", "--D1=32768,8,64", "--LL=8388608,16,64";
    functions = iterate_product, iterate_product_backwards, linearize_product, iterate_chain
);
