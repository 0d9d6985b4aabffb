use crate::error::DecodeError;
use crate::messages::Message;
use log::error;
use std::io::Write;

///Logs at error level the given error
pub fn show_error_message(error: &DecodeError) {
    let (error_code, message) = error.get_code_and_message();
    error!("\n");
    error!("**************************************************");
    error!("\tMeshview Ran into an error");
    error!("\tError Code: {:#X}", error_code);
    error!("\t{}", message);
    error!("**************************************************");
    error!("\n\n\n");
}

///Outputs the binary serial version of a message to stdout
pub fn send_message(message: &Message) {
    let stdout = std::io::stdout();
    let mut stdio_lock = stdout.lock();

    if bincode::serialize_into(&mut stdio_lock, message).is_err() || stdio_lock.flush().is_err() {
        error!("Could not write message to stdout");
    }
}

///Outputs the binary serial version of the error to stdout
pub fn send_error_message(error: DecodeError) {
    send_message(&Message::Error(error));
}
