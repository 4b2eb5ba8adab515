fn main() {
    minic::term::main();
}
